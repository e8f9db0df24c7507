//! Sequential document downloader.

use crate::error::{DownloadError, Result};
use crate::filename::{DefaultFilenameStrategy, FilenameStrategy};
use indicatif::{ProgressBar, ProgressStyle};
use scrapefrb_core::Document;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};

/// Write buffer size for document bodies.
pub const CHUNK_SIZE: usize = 8192;

/// Outcome of a download batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReport {
    /// Documents written to disk
    pub downloaded: usize,
    /// Documents whose file already existed
    pub skipped_existing: usize,
    /// Documents that could not be fetched
    pub failed: usize,
}

/// Result of a single target.
enum Outcome {
    Downloaded,
    SkippedExisting,
    Failed,
}

/// Downloads documents into one directory, one request at a time.
pub struct DownloadManager {
    client: reqwest::Client,
    dir: PathBuf,
    strategy: Box<dyn FilenameStrategy>,
    show_progress: bool,
}

impl DownloadManager {
    /// Create a manager writing into `dir` with the default naming rules.
    #[must_use]
    pub fn new(client: reqwest::Client, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            dir: dir.into(),
            strategy: Box::new(DefaultFilenameStrategy),
            show_progress: false,
        }
    }

    /// Replace the file naming rules.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn FilenameStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Show a console progress bar per file.
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download every target in order.
    ///
    /// Targets whose file already exists are skipped without a request.
    /// A failed request skips its target; the batch continues.
    ///
    /// # Errors
    /// Returns `DownloadError::Io` on local filesystem failures.
    pub async fn download(&self, targets: &[Document]) -> Result<DownloadReport> {
        let mut report = DownloadReport::default();

        tracing::info!(
            count = targets.len(),
            dir = %self.dir.display(),
            "Downloading documents"
        );

        for document in targets {
            match self.download_one(document).await? {
                Outcome::Downloaded => report.downloaded += 1,
                Outcome::SkippedExisting => report.skipped_existing += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        tracing::info!(
            downloaded = report.downloaded,
            skipped = report.skipped_existing,
            failed = report.failed,
            "Download batch finished"
        );

        Ok(report)
    }

    async fn already_present(&self, name: &str) -> Result<bool> {
        let path = self.dir.join(name);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| io_error(&path, source))
    }

    async fn download_one(&self, document: &Document) -> Result<Outcome> {
        let early_name = self.strategy.from_url(document);

        if let Some(name) = &early_name {
            if self.already_present(name).await? {
                tracing::info!("{} already exists, skipping", name);
                return Ok(Outcome::SkippedExisting);
            }
        }

        let mut response = match self.client.get(&document.url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(
                    url = %document.url,
                    status = %response.status(),
                    "Download failed"
                );
                return Ok(Outcome::Failed);
            }
            Err(e) => {
                tracing::warn!(url = %document.url, error = %e, "Download failed");
                return Ok(Outcome::Failed);
            }
        };

        let name = match early_name {
            Some(name) => name,
            None => {
                let name = self.strategy.from_response(document, response.headers());
                if self.already_present(&name).await? {
                    tracing::info!("{} already exists, skipping", name);
                    return Ok(Outcome::SkippedExisting);
                }
                name
            }
        };

        let final_path = self.dir.join(&name);
        let part_path = self.dir.join(format!("{name}.part"));
        let total = response.content_length();
        let progress = self.progress_bar(&name, total);

        let file = tokio::fs::File::create(&part_path)
            .await
            .map_err(|source| io_error(&part_path, source))?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
        let mut written: u64 = 0;
        let mut last_logged_quarter = 0;

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    progress.abandon();
                    drop(writer);
                    tracing::warn!(url = %document.url, error = %e, "Download interrupted");
                    tokio::fs::remove_file(&part_path)
                        .await
                        .map_err(|source| io_error(&part_path, source))?;
                    return Ok(Outcome::Failed);
                }
            };

            writer
                .write_all(&chunk)
                .await
                .map_err(|source| io_error(&part_path, source))?;
            written += chunk.len() as u64;
            progress.set_position(written);

            if let Some(total) = total.filter(|t| *t > 0) {
                let quarter = written * 4 / total;
                if quarter > last_logged_quarter {
                    last_logged_quarter = quarter;
                    tracing::debug!("{}: {}% downloaded", name, (written * 100 / total).min(100));
                }
            }
        }

        writer
            .flush()
            .await
            .map_err(|source| io_error(&part_path, source))?;
        drop(writer);

        tokio::fs::rename(&part_path, &final_path)
            .await
            .map_err(|source| io_error(&final_path, source))?;

        progress.finish_and_clear();
        tracing::info!("Downloaded {} ({} bytes)", name, written);

        Ok(Outcome::Downloaded)
    }

    fn progress_bar(&self, name: &str, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total.unwrap_or(0));
        let style = ProgressStyle::with_template(
            "{msg:40!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({percent}%)",
        )
        .map_or_else(|_| ProgressStyle::default_bar(), |style| style.progress_chars("=> "));
        bar.set_style(style);
        bar.set_message(name.to_string());
        bar
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DownloadError {
    DownloadError::Io {
        path: path.to_path_buf(),
        source,
    }
}
