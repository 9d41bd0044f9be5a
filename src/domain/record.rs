//! Raw database records
//!
//! A [`Record`] is one row as returned by the data source: an ordered list of
//! field names and their values. Field order is the order the source returned
//! them in and is preserved all the way into the sheet columns.

use crate::domain::{FolioError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// A single raw field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// SQL NULL or a missing column
    Null,
    /// Boolean
    Bool(bool),
    /// Any integer width
    Integer(i64),
    /// Floating point
    Float(f64),
    /// Exact decimal (NUMERIC)
    Decimal(Decimal),
    /// Text of any kind
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// Timestamp with time zone, normalized to UTC
    TimestampTz(DateTime<Utc>),
}

impl FieldValue {
    /// Returns true for SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the text content for text values
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Decimal(d) => write!(f, "{d}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::TimestampTz(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// One row from the data source
///
/// Column names are shared between all records of one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<FieldValue>,
}

impl Record {
    /// Creates a record from shared column names and values
    ///
    /// # Errors
    ///
    /// Returns a validation error if the value count does not match the column count.
    pub fn new(columns: Arc<[String]>, values: Vec<FieldValue>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(FolioError::Validation(format!(
                "Record has {} columns but {} values",
                columns.len(),
                values.len()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Builds a record from name/value pairs, in order
    pub fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<FieldValue>,
    {
        let (columns, values): (Vec<String>, Vec<FieldValue>) = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Field names in source order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Shared handle to the field names
    pub fn shared_columns(&self) -> Arc<[String]> {
        Arc::clone(&self.columns)
    }

    /// Whether this record uses exactly the given column list allocation
    pub fn shares_columns(&self, columns: &Arc<[String]>) -> bool {
        Arc::ptr_eq(&self.columns, columns)
    }

    /// Field values in source order
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Looks up a field by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| &self.values[idx])
    }

    /// Looks up a field by name, treating a missing column as NULL
    pub fn get_or_null(&self, name: &str) -> FieldValue {
        self.get(name).cloned().unwrap_or(FieldValue::Null)
    }

    /// Iterates `(name, value)` pairs in source order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_record_preserves_field_order() {
        let record = Record::from_pairs([
            ("filing_id", FieldValue::from("F100")),
            ("contributor_name", FieldValue::from("Smith, Jane")),
            ("contribution_amount", FieldValue::from(dec("50.00"))),
        ]);

        assert_eq!(
            record.columns(),
            &["filing_id", "contributor_name", "contribution_amount"]
        );
        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["filing_id", "contributor_name", "contribution_amount"]);
    }

    #[test]
    fn test_record_get() {
        let record = Record::from_pairs([("a", FieldValue::Integer(1)), ("b", FieldValue::Null)]);
        assert_eq!(record.get("a"), Some(&FieldValue::Integer(1)));
        assert_eq!(record.get("b"), Some(&FieldValue::Null));
        assert_eq!(record.get("c"), None);
        assert_eq!(record.get_or_null("c"), FieldValue::Null);
    }

    #[test]
    fn test_record_new_length_mismatch() {
        let columns: Arc<[String]> = vec!["a".to_string(), "b".to_string()].into();
        let result = Record::new(columns, vec![FieldValue::Null]);
        assert!(matches!(result, Err(FolioError::Validation(_))));
    }

    #[test]
    fn test_shares_columns() {
        let columns: Arc<[String]> = vec!["a".to_string()].into();
        let first = Record::new(Arc::clone(&columns), vec![FieldValue::Integer(1)]).unwrap();
        let copy = Record::from_pairs([("a", FieldValue::Integer(2))]);

        assert!(first.shares_columns(&columns));
        assert!(!copy.shares_columns(&columns));
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::Integer(-3).to_string(), "-3");
        assert_eq!(FieldValue::from("x").to_string(), "x");
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
        assert_eq!(
            FieldValue::Date(NaiveDate::from_ymd_opt(2016, 3, 9).unwrap()).to_string(),
            "2016-03-09"
        );
    }

    #[test]
    fn test_field_value_from_option() {
        let none: Option<&str> = None;
        assert!(FieldValue::from(none).is_null());
        assert_eq!(FieldValue::from(Some("a")), FieldValue::Text("a".to_string()));
    }
}
