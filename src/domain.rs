use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KiraError;

/// NCBI taxonomy identifier as entered. Only an all-digit id can resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxId(String);

impl TaxId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|ch| ch.is_ascii_digit())
    }

    /// Entrez term restricting a search to this organism and its subtree.
    pub fn organism_term(&self) -> String {
        format!("txid{}[Organism]", self.0)
    }

    pub fn report_file_name(&self) -> String {
        format!("taxid_{}_report.csv", self.0)
    }

    pub fn plot_file_name(&self) -> String {
        format!("taxid_{}_plot.png", self.0)
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxId {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(value))
    }
}

/// Closed interval of sequence lengths. An inverted range matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: i64,
    pub max: i64,
}

impl LengthRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, length: usize) -> bool {
        match i64::try_from(length) {
            Ok(length) => self.min <= length && length <= self.max,
            Err(_) => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

impl fmt::Display for LengthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// One nucleotide entry as the report sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqRecord {
    pub id: String,
    pub length: usize,
    pub description: String,
}

impl SeqRecord {
    pub fn new(id: impl Into<String>, length: usize, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            length,
            description: description.into(),
        }
    }
}

/// History-server tokens returned by `esearch usehistory=y`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub web_env: String,
    pub query_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub taxid: TaxId,
    pub organism_name: String,
    pub total_count: usize,
    pub handle: SessionHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(SearchResult),
    /// The taxon exists but has no nucleotide records.
    NotFound { organism_name: String },
}

/// What the fetcher is handed. Fetching without a search is a typed state,
/// not a missing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Active(SearchResult),
    NoSession,
}

impl Session {
    pub fn active(&self) -> Result<&SearchResult, KiraError> {
        match self {
            Session::Active(result) => Ok(result),
            Session::NoSession => Err(KiraError::NoSession),
        }
    }
}
