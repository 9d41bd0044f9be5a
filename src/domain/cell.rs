//! Display-ready sheet cells

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Display hint for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellFormat {
    /// No special formatting
    Plain,
    /// Two-decimal currency, e.g. `$1,234.50`
    Currency,
    /// A link shown through its label
    HyperlinkLabel,
}

/// How report links are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStyle {
    /// `HYPERLINK` formula showing the label
    #[default]
    Formula,
    /// The bare URL as plain text
    Plain,
}

/// Cell content
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Nothing
    Empty,
    /// Text
    Text(String),
    /// Number, kept exact
    Number(Decimal),
    /// Labeled link
    Link { url: String, label: String },
}

/// One sheet cell: a value plus a display hint
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Content
    pub value: CellValue,
    /// Display hint
    pub format: CellFormat,
}

/// One sheet row
pub type SheetRow = Vec<Cell>;

impl Cell {
    /// An empty plain cell
    pub fn empty() -> Self {
        Self {
            value: CellValue::Empty,
            format: CellFormat::Plain,
        }
    }

    /// A plain text cell
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(value.into()),
            format: CellFormat::Plain,
        }
    }

    /// A plain numeric cell
    pub fn number(value: Decimal) -> Self {
        Self {
            value: CellValue::Number(value),
            format: CellFormat::Plain,
        }
    }

    /// A currency cell
    pub fn currency(value: Decimal) -> Self {
        Self {
            value: CellValue::Number(value),
            format: CellFormat::Currency,
        }
    }

    /// A labeled link cell
    pub fn link(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: CellValue::Link {
                url: url.into(),
                label: label.into(),
            },
            format: CellFormat::HyperlinkLabel,
        }
    }

    /// Whether the cell has no content
    pub fn is_empty(&self) -> bool {
        matches!(self.value, CellValue::Empty)
    }

    /// The text a reader sees in a spreadsheet application
    pub fn display_text(&self) -> String {
        match (&self.value, self.format) {
            (CellValue::Empty, _) => String::new(),
            (CellValue::Text(s), _) => s.clone(),
            (CellValue::Link { label, .. }, _) => label.clone(),
            (CellValue::Number(n), CellFormat::Currency) => currency_text(*n),
            (CellValue::Number(n), _) => n.normalize().to_string(),
        }
    }
}

/// Renders an amount as `$#,##0.00`, with a leading minus for negatives
pub fn currency_text(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}${grouped}.{cents}", if negative { "-" } else { "" })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_currency_text() {
        assert_eq!(currency_text(dec("10")), "$10.00");
        assert_eq!(currency_text(dec("1234.5")), "$1,234.50");
        assert_eq!(currency_text(dec("0")), "$0.00");
        assert_eq!(currency_text(dec("1234567.891")), "$1,234,567.89");
        assert_eq!(currency_text(dec("100")), "$100.00");
        assert_eq!(currency_text(dec("999999")), "$999,999.00");
    }

    #[test]
    fn test_currency_text_negative() {
        assert_eq!(currency_text(dec("-75.255")), "-$75.26");
        assert_eq!(currency_text(dec("-0.001")), "$0.00");
    }

    #[test]
    fn test_display_text() {
        assert_eq!(Cell::empty().display_text(), "");
        assert_eq!(Cell::text("abc").display_text(), "abc");
        assert_eq!(Cell::currency(dec("20")).display_text(), "$20.00");
        assert_eq!(Cell::number(dec("2.50")).display_text(), "2.5");
        assert_eq!(
            Cell::link("http://example.com", "This report").display_text(),
            "This report"
        );
    }

    #[test]
    fn test_constructors_set_format() {
        assert_eq!(Cell::empty().format, CellFormat::Plain);
        assert_eq!(Cell::currency(dec("1")).format, CellFormat::Currency);
        assert_eq!(
            Cell::link("u", "l").format,
            CellFormat::HyperlinkLabel
        );
        assert!(Cell::empty().is_empty());
    }
}
