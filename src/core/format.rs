//! Cell formatting
//!
//! Pure conversions from raw field values to display-ready [`Cell`]s. The only
//! failures are unparsable amounts and dates; [`format_field`] absorbs them by
//! falling back to the raw text so a single bad value never aborts an export.

use crate::domain::{Cell, FieldValue, FolioError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Fields that always render as currency, whatever the category
pub const CURRENCY_COLUMNS: [&str; 10] = [
    "beginning_balance_this_period",
    "incurred_amount_this_period",
    "payment_amount_this_period",
    "balance_at_close_this_period",
    "expenditure_amount",
    "contribution_amount",
    "contribution_aggregate",
    "loan_amount_original",
    "loan_payment_to_date",
    "loan_balance",
];

/// Whether `field_name` is one of the [`CURRENCY_COLUMNS`]
pub fn is_currency_column(field_name: &str) -> bool {
    CURRENCY_COLUMNS.contains(&field_name)
}

/// Formats an amount as a currency cell
///
/// Accepts numeric values and numeric text (a leading `$` and thousands
/// separators are tolerated).
///
/// # Errors
///
/// Returns [`FolioError::InvalidNumber`] when the value is not a decimal amount.
pub fn format_currency(value: &FieldValue) -> Result<Cell> {
    parse_amount(value).map(Cell::currency)
}

fn parse_amount(value: &FieldValue) -> Result<Decimal> {
    match value {
        FieldValue::Decimal(d) => Ok(*d),
        FieldValue::Integer(i) => Ok(Decimal::from(*i)),
        FieldValue::Float(f) => Decimal::try_from(*f)
            .map_err(|_| FolioError::InvalidNumber(value.to_string())),
        FieldValue::Text(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| *c != ',' && *c != '$')
                .collect();
            Decimal::from_str(&cleaned)
                .or_else(|_| Decimal::from_scientific(&cleaned))
                .map_err(|_| FolioError::InvalidNumber(s.clone()))
        }
        other => Err(FolioError::InvalidNumber(other.to_string())),
    }
}

/// Formats a date as `M/D/YYYY`
///
/// # Errors
///
/// Returns [`FolioError::InvalidDate`] when the value is not a date.
pub fn format_date(value: &FieldValue) -> Result<Cell> {
    parse_date(value).map(|date| Cell::text(date.format("%-m/%-d/%Y").to_string()))
}

fn parse_date(value: &FieldValue) -> Result<NaiveDate> {
    match value {
        FieldValue::Date(d) => Ok(*d),
        FieldValue::Timestamp(ts) => Ok(ts.date()),
        FieldValue::TimestampTz(ts) => Ok(ts.date_naive()),
        FieldValue::Text(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
                .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ts| ts.date()))
                .or_else(|_| DateTime::parse_from_rfc3339(s).map(|ts| ts.date_naive()))
                .map_err(|_| FolioError::InvalidDate(s.to_string()))
        }
        other => Err(FolioError::InvalidDate(other.to_string())),
    }
}

/// Formats one transaction field
///
/// NULL becomes an empty plain cell, currency columns become currency cells and
/// everything else keeps its raw textual form (numbers stay numeric).
pub fn format_field(field_name: &str, value: &FieldValue) -> Cell {
    if value.is_null() {
        return Cell::empty();
    }

    if is_currency_column(field_name) {
        return match format_currency(value) {
            Ok(cell) => cell,
            Err(e) => {
                tracing::debug!(
                    field = field_name,
                    error = %e,
                    "Currency value not parsable, keeping raw text"
                );
                Cell::text(value.to_string())
            }
        };
    }

    plain_cell(value)
}

/// Formats a currency value, degrading to plain text on parse failure
pub fn currency_or_text(value: &FieldValue) -> Cell {
    if value.is_null() {
        return Cell::empty();
    }
    format_currency(value).unwrap_or_else(|_| Cell::text(value.to_string()))
}

/// Formats a date value, degrading to plain text on parse failure
pub fn date_or_text(value: &FieldValue) -> String {
    format_date(value)
        .map(|cell| cell.display_text())
        .unwrap_or_else(|_| value.to_string())
}

fn plain_cell(value: &FieldValue) -> Cell {
    match value {
        FieldValue::Null => Cell::empty(),
        FieldValue::Integer(i) => Cell::number(Decimal::from(*i)),
        FieldValue::Decimal(d) => Cell::number(*d),
        FieldValue::Float(f) => Decimal::try_from(*f)
            .map(Cell::number)
            .unwrap_or_else(|_| Cell::text(f.to_string())),
        other => Cell::text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellFormat, CellValue};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_currency_from_text() {
        let cell = format_currency(&FieldValue::from("1234.5")).unwrap();
        assert_eq!(cell.format, CellFormat::Currency);
        assert_eq!(cell.value, CellValue::Number(dec("1234.5")));
        assert_eq!(cell.display_text(), "$1,234.50");
    }

    #[test]
    fn test_format_currency_tolerates_symbols() {
        let cell = format_currency(&FieldValue::from("$1,000.10")).unwrap();
        assert_eq!(cell.display_text(), "$1,000.10");
    }

    #[test]
    fn test_format_currency_negative_and_large() {
        let cell = format_currency(&FieldValue::Decimal(dec("-250"))).unwrap();
        assert_eq!(cell.display_text(), "-$250.00");
        let cell = format_currency(&FieldValue::Integer(12_000_000)).unwrap();
        assert_eq!(cell.display_text(), "$12,000,000.00");
    }

    #[test]
    fn test_format_currency_invalid() {
        let result = format_currency(&FieldValue::from("n/a"));
        assert!(matches!(result, Err(FolioError::InvalidNumber(_))));
        let result = format_currency(&FieldValue::Bool(true));
        assert!(matches!(result, Err(FolioError::InvalidNumber(_))));
    }

    #[test]
    fn test_format_date() {
        let date = FieldValue::Date(NaiveDate::from_ymd_opt(2016, 1, 5).unwrap());
        assert_eq!(format_date(&date).unwrap().display_text(), "1/5/2016");

        let text = FieldValue::from("2015-12-31");
        assert_eq!(format_date(&text).unwrap().display_text(), "12/31/2015");

        let compact = FieldValue::from("20160701");
        assert_eq!(format_date(&compact).unwrap().display_text(), "7/1/2016");
    }

    #[test]
    fn test_format_date_invalid() {
        let result = format_date(&FieldValue::from("someday"));
        assert!(matches!(result, Err(FolioError::InvalidDate(_))));
        assert!(format_date(&FieldValue::Null).is_err());
    }

    #[test]
    fn test_format_field_null_is_empty() {
        for name in ["contribution_amount", "contributor_name"] {
            let cell = format_field(name, &FieldValue::Null);
            assert_eq!(cell, Cell::empty());
            assert_ne!(cell.display_text(), "null");
        }
    }

    #[test]
    fn test_format_field_currency_columns() {
        for name in CURRENCY_COLUMNS {
            let cell = format_field(name, &FieldValue::Decimal(dec("-5")));
            assert_eq!(cell.format, CellFormat::Currency, "column {name}");
        }
    }

    #[test]
    fn test_format_field_plain() {
        let cell = format_field("contributor_name", &FieldValue::from("Doe, John"));
        assert_eq!(cell, Cell::text("Doe, John"));

        let cell = format_field("memo_code", &FieldValue::Integer(7));
        assert_eq!(cell.format, CellFormat::Plain);
        assert_eq!(cell.display_text(), "7");
    }

    #[test]
    fn test_format_field_bad_currency_degrades() {
        let cell = format_field("loan_balance", &FieldValue::from("unknown"));
        assert_eq!(cell, Cell::text("unknown"));
    }

    #[test]
    fn test_fallback_helpers() {
        assert_eq!(currency_or_text(&FieldValue::Null), Cell::empty());
        assert_eq!(currency_or_text(&FieldValue::from("x")), Cell::text("x"));
        assert_eq!(date_or_text(&FieldValue::from("soon")), "soon");
        assert_eq!(date_or_text(&FieldValue::from("2016-02-29")), "2/29/2016");
    }
}
