//! scrapefrb Scanner - Discovery of FR Y-6 filings across the Reserve Bank sites.
//!
//! This crate scrapes each enabled source, normalizes its listing into typed
//! documents, diffs them against the store, and hands the new ones to the
//! downloader.
//!
//! # Features
//!
//! - Three scraper variants: paged JSON reader, per-year static table and
//!   postback-driven pager
//! - Bounded retry on every fetch, with per-unit degradation on failure
//! - Header-variant resolution that tolerates cosmetic markup changes
//! - A CSV log of every document scraped in a run
//!
//! # Example
//!
//! ```rust,ignore
//! use scrapefrb_scanner::{Pipeline, RunContext, RunOptions};
//!
//! let pipeline = Pipeline::new(RunContext {
//!     workdir,
//!     store,
//!     fetcher,
//!     registry,
//!     options: RunOptions::default(),
//!     started_at: chrono::Utc::now(),
//! });
//!
//! let summary = pipeline.run().await?;
//! println!("{} new of {} scraped", summary.new, summary.total);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod diff;
#[allow(missing_docs)]
pub mod error;
pub mod fetch;
#[allow(missing_docs)]
pub mod filter;
pub mod normalizer;
pub mod pipeline;
pub mod run_log;
pub mod strategies;
pub mod table;

// Re-export commonly used types
pub use diff::diff;
pub use error::{NormalizeError, Result, ScanError};
pub use fetch::HttpFetcher;
pub use filter::SourceFilter;
pub use normalizer::{normalize, resolve_headers, ResolvedHeaders};
pub use pipeline::{Pipeline, RunContext, RunOptions, RunSummary, SourceSummary};
pub use run_log::{write_run_log, RUN_LOG_HEADER};
pub use strategies::{
    PageRequest, PagerState, PaginationState, PaginationStateMachine, SourceScraper,
};
pub use table::{ScrapedTable, URL_COLUMN};
