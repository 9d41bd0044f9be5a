//! Row decoding
//!
//! Maps PostgreSQL rows and column types onto domain [`Record`]s, and binds
//! filing identifiers to whatever type the `filing_id` column has.

use crate::domain::{FieldValue, FilingId, FolioError, Record, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::Row;

/// A filing identifier converted to the parameter type of a statement
#[derive(Debug, Clone, PartialEq)]
pub enum FilingKey {
    /// Text-like column
    Text(String),
    /// `integer` column
    Int4(i32),
    /// `bigint` column
    Int8(i64),
}

impl FilingKey {
    /// Converts `filing_id` for a parameter of type `ty`
    ///
    /// Returns `None` when the identifier cannot exist in a column of that type
    /// (e.g. `"F100"` against an integer column).
    pub fn for_param(ty: Option<&Type>, filing_id: &FilingId) -> Option<Self> {
        let raw = filing_id.as_str();
        match ty {
            Some(t) if *t == Type::INT4 => raw.parse().ok().map(FilingKey::Int4),
            Some(t) if *t == Type::INT8 => raw.parse().ok().map(FilingKey::Int8),
            _ => Some(FilingKey::Text(raw.to_string())),
        }
    }

    /// The key as a query parameter
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            FilingKey::Text(s) => s,
            FilingKey::Int4(i) => i,
            FilingKey::Int8(i) => i,
        }
    }
}

/// Converts a row into a [`Record`]
///
/// `columns` caches the column names of a result set so every record of one
/// stream shares them.
pub fn row_to_record(row: &Row, columns: &mut Option<Arc<[String]>>) -> Result<Record> {
    let names = match columns {
        Some(names) => Arc::clone(names),
        None => {
            let names: Arc<[String]> = row
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            *columns = Some(Arc::clone(&names));
            names
        }
    };

    let values = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| decode_value(row, idx, column.type_()))
        .collect::<Result<Vec<_>>>()?;

    Record::new(names, values)
}

/// Converts a batch of rows, sharing one column list
pub fn rows_to_records(rows: &[Row], columns: &mut Option<Arc<[String]>>) -> Result<Vec<Record>> {
    rows.iter().map(|row| row_to_record(row, columns)).collect()
}

fn decode_value(row: &Row, idx: usize, ty: &Type) -> Result<FieldValue> {
    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx)?.map(FieldValue::Bool),
        Type::INT2 => get::<i16>(row, idx)?.map(|v| FieldValue::Integer(v.into())),
        Type::INT4 => get::<i32>(row, idx)?.map(|v| FieldValue::Integer(v.into())),
        Type::INT8 => get::<i64>(row, idx)?.map(FieldValue::Integer),
        Type::OID => get::<u32>(row, idx)?.map(|v| FieldValue::Integer(v.into())),
        Type::FLOAT4 => get::<f32>(row, idx)?.map(|v| FieldValue::Float(v.into())),
        Type::FLOAT8 => get::<f64>(row, idx)?.map(FieldValue::Float),
        Type::NUMERIC => get::<Decimal>(row, idx)?.map(FieldValue::Decimal),
        Type::DATE => get::<NaiveDate>(row, idx)?.map(FieldValue::Date),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx)?.map(FieldValue::Timestamp),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx)?.map(FieldValue::TimestampTz),
        Type::JSON | Type::JSONB => {
            get::<serde_json::Value>(row, idx)?.map(|v| FieldValue::Text(v.to_string()))
        }
        Type::UUID => get::<uuid::Uuid>(row, idx)?.map(|v| FieldValue::Text(v.to_string())),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get::<String>(row, idx)?.map(FieldValue::Text)
        }
        _ => {
            tracing::debug!(
                column = row.columns()[idx].name(),
                column_type = ty.name(),
                "Unsupported column type, exporting as empty"
            );
            None
        }
    };
    Ok(value.unwrap_or(FieldValue::Null))
}

fn get<'a, T>(row: &'a Row, idx: usize) -> Result<Option<T>>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx).map_err(|e| {
        FolioError::SourceUnavailable(format!(
            "Failed to decode column '{}': {e}",
            row.columns()[idx].name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> FilingId {
        FilingId::new(raw).unwrap()
    }

    #[test]
    fn test_filing_key_text() {
        assert_eq!(
            FilingKey::for_param(Some(&Type::VARCHAR), &id("F100")),
            Some(FilingKey::Text("F100".to_string()))
        );
        assert_eq!(
            FilingKey::for_param(None, &id("1285143")),
            Some(FilingKey::Text("1285143".to_string()))
        );
    }

    #[test]
    fn test_filing_key_integer_columns() {
        assert_eq!(
            FilingKey::for_param(Some(&Type::INT4), &id("1285143")),
            Some(FilingKey::Int4(1_285_143))
        );
        assert_eq!(
            FilingKey::for_param(Some(&Type::INT8), &id("1285143")),
            Some(FilingKey::Int8(1_285_143))
        );
        assert_eq!(FilingKey::for_param(Some(&Type::INT4), &id("F100")), None);
    }
}
