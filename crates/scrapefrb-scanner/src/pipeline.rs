//! Run orchestration: scrape, normalize, diff, persist, download.
//!
//! Sources are processed one after another in their fixed order. A source
//! that cannot be reached or whose headers no longer resolve contributes no
//! documents; a date or integer that fails to parse stops the run.

use crate::error::{Result, ScanError};
use crate::fetch::HttpFetcher;
use crate::normalizer::normalize;
use crate::run_log::write_run_log;
use crate::strategies::SourceScraper;
use crate::diff::diff;
use chrono::{DateTime, Utc};
use scrapefrb_core::{Document, SourceCode, WorkDir};
use scrapefrb_db::{InsertReport, PersistentStore};
use scrapefrb_download::{DownloadManager, DownloadReport};
use scrapefrb_source::{SourceDefinition, SourceRegistry};
use std::path::PathBuf;

/// Switches for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Scrape and diff only.
    pub dry_run: bool,
    /// Insert and log, but skip downloads.
    pub no_download: bool,
    /// Download every scraped document rather than only new ones.
    pub download_all: bool,
    /// Sources to process, in processing order.
    pub sources: Vec<SourceCode>,
    /// Replaces each definition's pager round cap.
    pub max_pager_rounds: Option<u32>,
    /// Draw a progress bar while downloading.
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            no_download: false,
            download_all: false,
            sources: SourceCode::ALL.to_vec(),
            max_pager_rounds: None,
            show_progress: false,
        }
    }
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Working directory layout
    pub workdir: WorkDir,
    /// Opened document store
    pub store: PersistentStore,
    /// HTTP client shared by scraping and downloading
    pub fetcher: HttpFetcher,
    /// Loaded source definitions
    pub registry: SourceRegistry,
    /// Run switches
    pub options: RunOptions,
    /// Run timestamp, stamped on every inserted row
    pub started_at: DateTime<Utc>,
}

/// Outcome of one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    /// Source code
    pub source: SourceCode,
    /// Documents normalized from the source
    pub documents: usize,
    /// Error that made the source contribute nothing, if any
    pub error: Option<String>,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Per-source results in processing order
    pub per_source: Vec<SourceSummary>,
    /// Documents scraped across all sources
    pub total: usize,
    /// Documents not yet in the store
    pub new: usize,
    /// Store insert outcome (absent on dry runs)
    pub insert: Option<InsertReport>,
    /// Download outcome (absent on dry runs and with downloads disabled)
    pub download: Option<DownloadReport>,
    /// Path of the CSV run log (absent on dry runs)
    pub run_log: Option<PathBuf>,
}

/// Executes one run against a [`RunContext`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    context: RunContext,
}

impl Pipeline {
    /// Create a pipeline over `context`.
    #[must_use]
    pub fn new(context: RunContext) -> Self {
        Self { context }
    }

    /// The run context.
    #[must_use]
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Run every stage.
    ///
    /// # Errors
    /// Fatal normalization errors, store failures, run-log write failures and
    /// local filesystem errors while downloading.
    pub async fn run(&self) -> Result<RunSummary> {
        let ctx = &self.context;
        let options = &ctx.options;
        let mut summary = RunSummary::default();

        let persisted = ctx.store.load_identity_set().await?;
        tracing::info!(stored = persisted.len(), "Loaded stored filing identities");

        let definitions = ctx.registry.select(&options.sources);
        for code in &options.sources {
            if !definitions.iter().any(|d| d.code() == *code) {
                tracing::warn!(source = %code, "no definition loaded for source, skipping");
            }
        }

        let mut documents: Vec<Document> = Vec::new();
        for definition in &definitions {
            let source_summary = self.run_source(definition, &mut documents).await?;
            summary.per_source.push(source_summary);
        }

        let new_documents = diff(&persisted, &documents);
        summary.total = documents.len();
        summary.new = new_documents.len();
        tracing::info!(
            "{} files scraped, {} not yet stored",
            summary.total,
            summary.new
        );

        if options.dry_run {
            tracing::info!("Dry run: skipping store, run log and downloads");
            return Ok(summary);
        }

        let report = ctx.store.insert(&new_documents, ctx.started_at).await?;
        summary.insert = Some(report);

        let run_log = ctx.workdir.run_log_path(ctx.started_at);
        write_run_log(&run_log, &documents)?;
        tracing::info!(path = %run_log.display(), "Wrote run log");
        summary.run_log = Some(run_log);

        if options.no_download {
            tracing::info!("Downloads disabled for this run");
            return Ok(summary);
        }

        let targets = if options.download_all {
            &documents
        } else {
            &new_documents
        };
        let manager = DownloadManager::new(ctx.fetcher.client().clone(), ctx.workdir.downloads_dir())
            .with_progress(options.show_progress);
        summary.download = Some(manager.download(targets).await?);

        Ok(summary)
    }

    async fn run_source(
        &self,
        definition: &SourceDefinition,
        documents: &mut Vec<Document>,
    ) -> Result<SourceSummary> {
        let code = definition.code();
        let mut source_summary = SourceSummary {
            source: code,
            documents: 0,
            error: None,
        };

        let scraper = match SourceScraper::from_definition(
            definition,
            self.context.options.max_pager_rounds,
        ) {
            Ok(scraper) => scraper,
            Err(e) => {
                tracing::error!(source = %code, error = %e, "cannot build scraper for source");
                source_summary.error = Some(e.to_string());
                return Ok(source_summary);
            }
        };

        tracing::debug!(source = %code, strategy = scraper.kind(), "scraping source");
        let table = match scraper.scrape(&self.context.fetcher).await {
            Ok(table) => table,
            Err(e) => {
                tracing::error!(source = %code, error = %e, "scrape failed");
                source_summary.error = Some(e.to_string());
                return Ok(source_summary);
            }
        };

        match normalize(definition, &table) {
            Ok(normalized) => {
                tracing::info!("Parsed {} files from {}", normalized.len(), definition.name());
                source_summary.documents = normalized.len();
                documents.extend(normalized);
            }
            Err(e) if !e.is_fatal() => {
                tracing::error!(
                    source = %code,
                    error = %e,
                    "source markup no longer matches its header map, skipping"
                );
                source_summary.error = Some(e.to_string());
            }
            Err(e) => return Err(ScanError::Normalize(e)),
        }

        Ok(source_summary)
    }
}
