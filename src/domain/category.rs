//! Transaction category registry
//!
//! The closed set of transaction categories and their static table, sort column
//! and sheet name mappings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A transaction category exported as one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionCategory {
    /// Itemized receipts
    Contributions,
    /// Itemized disbursements
    Expenditures,
    /// Independent expenditures
    #[serde(alias = "ies", alias = "independent_expenditures")]
    IndependentExpenditures,
    /// Debts and obligations
    Debts,
    /// Loans
    Loans,
}

impl TransactionCategory {
    /// All categories in workbook order
    pub const ALL: [TransactionCategory; 5] = [
        TransactionCategory::Contributions,
        TransactionCategory::Expenditures,
        TransactionCategory::IndependentExpenditures,
        TransactionCategory::Debts,
        TransactionCategory::Loans,
    ];

    /// Category name, also used as the sheet name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Contributions => "contributions",
            TransactionCategory::Expenditures => "expenditures",
            TransactionCategory::IndependentExpenditures => "independent-expenditures",
            TransactionCategory::Debts => "debts",
            TransactionCategory::Loans => "loans",
        }
    }

    /// Sheet name for this category
    pub fn sheet_name(&self) -> &'static str {
        self.as_str()
    }

    /// Source table
    pub fn table(&self) -> &'static str {
        match self {
            TransactionCategory::Contributions => "fec_contributions",
            TransactionCategory::Expenditures => "fec_expenditures",
            TransactionCategory::IndependentExpenditures => "fec_ies",
            TransactionCategory::Debts => "fec_debts",
            TransactionCategory::Loans => "fec_loans",
        }
    }

    /// Column the category's rows are sorted by, descending
    pub fn sort_column(&self) -> &'static str {
        match self {
            TransactionCategory::Contributions => "contribution_amount",
            TransactionCategory::Expenditures | TransactionCategory::IndependentExpenditures => {
                "expenditure_amount"
            }
            TransactionCategory::Debts => "balance_at_close_this_period",
            TransactionCategory::Loans => "loan_balance",
        }
    }

    /// Sorts a category list into workbook order and removes duplicates
    pub fn in_workbook_order(categories: &[TransactionCategory]) -> Vec<TransactionCategory> {
        Self::ALL
            .into_iter()
            .filter(|c| categories.contains(c))
            .collect()
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contributions" => Ok(TransactionCategory::Contributions),
            "expenditures" => Ok(TransactionCategory::Expenditures),
            // "ies" is the historical table suffix
            "independent-expenditures" | "independent_expenditures" | "ies" => {
                Ok(TransactionCategory::IndependentExpenditures)
            }
            "debts" => Ok(TransactionCategory::Debts),
            "loans" => Ok(TransactionCategory::Loans),
            other => Err(format!("Unknown transaction category '{other}'")),
        }
    }
}
