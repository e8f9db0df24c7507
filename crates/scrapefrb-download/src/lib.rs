//! scrapefrb Download - Fetches filing documents into the working directory.
//!
//! Targets are processed one at a time. A target whose local file already
//! exists costs no request, a failed request skips only that target, and
//! bodies are streamed into `<name>.part` before being renamed into place.
//!
//! # Example
//!
//! ```no_run
//! use scrapefrb_download::DownloadManager;
//!
//! # async fn example(documents: Vec<scrapefrb_core::Document>) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = DownloadManager::new(reqwest::Client::new(), "./downloads").with_progress(true);
//! let report = manager.download(&documents).await?;
//! println!("{} downloaded, {} already present", report.downloaded, report.skipped_existing);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod filename;
pub mod manager;

// Re-export commonly used types
pub use error::{DownloadError, Result};
pub use filename::{sanitize_filename, DefaultFilenameStrategy, FilenameStrategy};
pub use manager::{DownloadManager, DownloadReport, CHUNK_SIZE};
