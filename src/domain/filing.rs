//! Filing metadata and summary aggregates

use crate::domain::ids::FilingId;
use crate::domain::record::{FieldValue, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filing metadata, fetched once per request
#[derive(Debug, Clone, PartialEq)]
pub struct Filing {
    /// Filing identifier
    pub id: FilingId,

    /// Name of the filing committee
    pub committee_name: String,

    /// Filer committee identification number (e.g. `C00575795`)
    pub filer_committee_id_number: String,

    /// Start of the coverage period
    pub coverage_from_date: FieldValue,

    /// End of the coverage period
    pub coverage_through_date: FieldValue,
}

impl Filing {
    /// Builds filing metadata from a `fec_filings` row
    pub fn from_record(id: FilingId, record: &Record) -> Self {
        Self {
            id,
            committee_name: record.get_or_null("committee_name").to_string(),
            filer_committee_id_number: record.get_or_null("filer_committee_id_number").to_string(),
            coverage_from_date: record.get_or_null("coverage_from_date"),
            coverage_through_date: record.get_or_null("coverage_through_date"),
        }
    }
}

/// Summary form variant
///
/// The orchestrator checks the kinds in [`SummaryKind::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    /// Presidential campaign summary
    Presidential,
    /// Political action committee summary
    Pac,
    /// House/Senate campaign summary
    Campaign,
}

impl SummaryKind {
    /// All summary kinds in the order they are checked
    pub const ALL: [SummaryKind; 3] = [
        SummaryKind::Presidential,
        SummaryKind::Pac,
        SummaryKind::Campaign,
    ];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryKind::Presidential => "presidential",
            SummaryKind::Pac => "pac",
            SummaryKind::Campaign => "campaign",
        }
    }

    /// Table holding this kind's summaries
    pub fn table(&self) -> &'static str {
        match self {
            SummaryKind::Presidential => "fec_presidential_summaries",
            SummaryKind::Pac => "fec_pac_summaries",
            SummaryKind::Campaign => "fec_campaign_summaries",
        }
    }

    /// Label of the to-date column ("Year" for PACs, "Cycle" otherwise)
    pub fn to_date_label(&self) -> &'static str {
        match self {
            SummaryKind::Pac => "Year",
            SummaryKind::Presidential | SummaryKind::Campaign => "Cycle",
        }
    }

    /// Whether this kind reports independent expenditures
    pub fn has_independent_expenditures(&self) -> bool {
        matches!(self, SummaryKind::Pac)
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "presidential" => Ok(SummaryKind::Presidential),
            "pac" => Ok(SummaryKind::Pac),
            "campaign" => Ok(SummaryKind::Campaign),
            other => Err(format!("Unknown summary kind '{other}'")),
        }
    }
}

/// "This period" and "to date" values of one summary line
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPair {
    /// Column A, this period
    pub period: FieldValue,
    /// Column B, year or cycle to date
    pub to_date: FieldValue,
}

impl ColumnPair {
    fn from_record(record: &Record, column: &str) -> Self {
        Self {
            period: record.get_or_null(&format!("col_a_{column}")),
            to_date: record.get_or_null(&format!("col_b_{column}")),
        }
    }
}

/// One summary aggregate record
///
/// Amounts stay raw; the renderer formats them and degrades malformed ones to
/// plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    /// Which summary form this came from
    pub kind: SummaryKind,

    /// Committee name as reported on the summary
    pub committee_name: String,

    /// Filer committee identification number
    pub filer_committee_id_number: String,

    /// Start of the coverage period
    pub coverage_from_date: FieldValue,

    /// End of the coverage period
    pub coverage_through_date: FieldValue,

    /// Cash on hand at close of period (column A)
    pub cash_on_hand: FieldValue,

    /// Debts owed by the committee (column A)
    pub debts: FieldValue,

    /// Total receipts
    pub total_receipts: ColumnPair,

    /// Independent expenditures, only present for [`SummaryKind::Pac`]
    pub independent_expenditures: Option<ColumnPair>,

    /// Total disbursements
    pub total_disbursements: ColumnPair,
}

impl SummaryRecord {
    /// Builds a summary from a summary table row
    ///
    /// Missing columns are treated as NULL.
    pub fn from_record(kind: SummaryKind, record: &Record) -> Self {
        let independent_expenditures = kind
            .has_independent_expenditures()
            .then(|| ColumnPair::from_record(record, "independent_expenditures"));

        Self {
            kind,
            committee_name: record.get_or_null("committee_name").to_string(),
            filer_committee_id_number: record.get_or_null("filer_committee_id_number").to_string(),
            coverage_from_date: record.get_or_null("coverage_from_date"),
            coverage_through_date: record.get_or_null("coverage_through_date"),
            cash_on_hand: record.get_or_null("col_a_cash_on_hand_close_of_period"),
            debts: record.get_or_null("col_a_debts_by"),
            total_receipts: ColumnPair::from_record(record, "total_receipts"),
            independent_expenditures,
            total_disbursements: ColumnPair::from_record(record, "total_disbursements"),
        }
    }
}
