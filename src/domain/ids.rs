//! Domain identifier types with validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest filing identifier accepted from a request path
const MAX_FILING_ID_LEN: usize = 64;

/// Filing identifier newtype wrapper
///
/// Identifies one filing. The identifier travels through URL paths, SQL
/// parameters and the download filename, so only ASCII letters, digits, `-` and
/// `_` are accepted.
///
/// # Examples
///
/// ```
/// use folio::domain::ids::FilingId;
/// use std::str::FromStr;
///
/// let filing_id = FilingId::from_str("1285143").unwrap();
/// assert_eq!(filing_id.as_str(), "1285143");
/// assert!(FilingId::from_str("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilingId(String);

impl FilingId {
    /// Creates a new FilingId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(FilingId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Filing ID cannot be empty".to_string());
        }

        if id.len() > MAX_FILING_ID_LEN {
            return Err(format!(
                "Filing ID cannot be longer than {MAX_FILING_ID_LEN} characters"
            ));
        }

        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(format!("Filing ID contains invalid character '{c}'"));
        }

        Ok(Self(id))
    }

    /// Returns the filing ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FilingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FilingId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for FilingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
