//! Working directory layout.
//!
//! A working directory holds the downloaded filings, the logs and the
//! persisted store:
//!
//! ```text
//! <root>/
//!   downloads/
//!   log/
//!   frb_files.db
//! ```

use crate::error::{Result, ScrapeFrbError};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};

/// File name of the persisted store inside the working directory.
pub const STORE_FILE_NAME: &str = "frb_files.db";

/// Resolved working directory with its subdirectories created.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
    downloads: PathBuf,
    log: PathBuf,
}

impl WorkDir {
    /// Create the working directory and its `downloads/` and `log/` subdirectories.
    ///
    /// Relative roots are made absolute against the current directory.
    ///
    /// # Errors
    /// Returns `ScrapeFrbError::WorkDir` if any directory cannot be created.
    pub fn prepare(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };

        let downloads = root.join("downloads");
        let log = root.join("log");

        for dir in [&root, &downloads, &log] {
            if !dir.is_dir() {
                tracing::info!("{} does not exist. Creating the new directory.", dir.display());
            }
            std::fs::create_dir_all(dir).map_err(|source| ScrapeFrbError::WorkDir {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(Self {
            root,
            downloads,
            log,
        })
    }

    /// The working directory itself.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory downloaded filings are written to.
    #[must_use]
    pub fn downloads_dir(&self) -> &Path {
        &self.downloads
    }

    /// Directory for the daily log file and the CSV run logs.
    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log
    }

    /// Path of the SQLite store.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.root.join(STORE_FILE_NAME)
    }

    /// Path of the tracing log file for a given day.
    #[must_use]
    pub fn daily_log_path(&self, day: NaiveDate) -> PathBuf {
        self.log
            .join(format!("scrapefrb-{}.log", day.format("%Y-%m-%d")))
    }

    /// Path of the CSV run log for a run started at `started_at`.
    #[must_use]
    pub fn run_log_path(&self, started_at: DateTime<Utc>) -> PathBuf {
        self.log
            .join(format!("fry6-{}.csv", started_at.format("%Y%m%d-%H%M%S")))
    }
}
