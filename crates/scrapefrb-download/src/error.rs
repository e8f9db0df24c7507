//! Download error types.
//!
//! Only local filesystem failures surface as errors. Network failures are
//! counted per target in the [`DownloadReport`](crate::DownloadReport).

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a download batch.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Local filesystem failure while writing a document
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being written or renamed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for download operations.
pub type Result<T> = std::result::Result<T, DownloadError>;
