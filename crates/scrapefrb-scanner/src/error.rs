use scrapefrb_core::SourceCode;
use scrapefrb_source::CanonicalField;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(
        "no successful response from {url} after {attempts} attempts (last status: {})",
        display_status(.last_status)
    )]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_status: Option<u16>,
    },

    #[error("unexpected JSON from {url}: {reason}")]
    Json { url: String, reason: String },

    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Store error: {0}")]
    Store(#[from] scrapefrb_db::StoreError),

    #[error("Download error: {0}")]
    Download(#[from] scrapefrb_download::DownloadError),

    #[error("Source error: {0}")]
    Source(#[from] scrapefrb_source::SourceError),

    #[error("cannot write run log {path}: {source}")]
    RunLog {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Errors turning a scraped table into documents.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// No header matches any accepted variant of a canonical field.
    #[error("source {source_code}: no column matches the '{field}' header variants (headers: {headers:?})")]
    UnresolvedHeader {
        source_code: SourceCode,
        field: CanonicalField,
        headers: Vec<String>,
    },

    #[error("source {source_code}: cannot parse date '{value}' with format '{format}'")]
    InvalidDate {
        source_code: SourceCode,
        value: String,
        format: String,
    },

    /// A row-level RSSD or year that is not an integer; the row is dropped.
    #[error("source {source_code}: '{value}' in column '{column}' is not an integer")]
    InvalidInteger {
        source_code: SourceCode,
        column: String,
        value: String,
    },
}

impl NormalizeError {
    /// Whether the run must stop. Only a broken date contract does.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidDate { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}
