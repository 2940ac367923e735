use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid {field}: {value:?} is not an integer")]
    #[diagnostic(help("length bounds must be whole numbers, e.g. 500"))]
    InvalidNumber { field: &'static str, value: String },

    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("taxonomy lookup failed for {taxid}: {message}")]
    TaxonLookup { taxid: String, message: String },

    #[error("NCBI request failed: {0}")]
    NcbiHttp(String),

    #[error("NCBI returned status {status}: {message}")]
    NcbiStatus { status: u16, message: String },

    #[error("unexpected NCBI response: {0}")]
    NcbiPayload(String),

    #[error("no active search session; run a search before fetching")]
    NoSession,

    #[error("failed to parse GenBank page at offset {start}: {message}")]
    GenbankParse { start: usize, message: String },

    #[error("failed to write report {path}: {message}")]
    ReportWrite { path: String, message: String },

    #[error("failed to render chart: {0}")]
    ChartRender(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("terminal I/O failed: {0}")]
    Io(String),
}

impl KiraError {
    /// Remote failures are recovered by the workflow; everything else is not.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            KiraError::TaxonLookup { .. }
                | KiraError::NcbiHttp(_)
                | KiraError::NcbiStatus { .. }
                | KiraError::NcbiPayload(_)
        )
    }
}
