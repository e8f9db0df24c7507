//! scrapefrb Core - Foundation crate for the FR Y-6 filing scraper.
//!
//! This crate provides the shared document model, error handling, configuration
//! management and working-directory layout that all other scrapefrb crates
//! depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - The canonical [`Document`], [`SourceCode`] and identity types
//! - [`workdir`] - Working directory layout (`downloads/`, `log/`, store file)
//!
//! # Example
//!
//! ```rust
//! use scrapefrb_core::{AppConfig, SourceCode};
//!
//! let config = AppConfig::default();
//! assert!(config.sources.enabled.contains(&SourceCode::Atlanta));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;
pub mod workdir;

// Re-export commonly used types
pub use config::{AppConfig, DownloadConfig, GeneralConfig, ScanningConfig, SourcesConfig};
pub use error::{ConfigError, ConfigResult, Result, ScrapeFrbError};
pub use types::{
    collapse_whitespace, parse_filing_date, parse_integer_like, Document, IdentityKey,
    PersistedIdentitySet, SourceCode,
};
pub use workdir::WorkDir;
