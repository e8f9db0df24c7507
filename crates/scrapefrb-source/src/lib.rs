//! scrapefrb Source - Definitions of the sites FR Y-6 filings are scraped from.
//!
//! Each site is described by a TOML definition: static metadata, the scraping
//! strategy that reaches its listings, and the header variants that map its
//! columns onto canonical document fields.
//!
//! # Architecture
//!
//! - **Definition Types** ([`definition`]): Strongly-typed source metadata and strategy
//! - **Loader** ([`loader`]): Built-in definitions or a directory of TOML files
//! - **Registry** ([`registry`]): In-memory cache keyed by source code
//! - **Errors** ([`error`]): Source-specific error types
//!
//! # Example
//!
//! ```rust
//! use scrapefrb_core::SourceCode;
//! use scrapefrb_source::SourceRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SourceRegistry::builtin()?;
//! let chicago = registry.get(SourceCode::Chicago)?;
//!
//! println!("Source: {}", chicago.name());
//! println!("Strategy: {}", chicago.strategy.kind());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod definition;
pub mod error;
pub mod loader;
pub mod registry;

// Re-export commonly used types
pub use definition::{
    CanonicalField, HeaderMap, ScraperStrategy, SourceDefinition, SourceDescriptor,
    DEFAULT_MAX_ROUNDS,
};
pub use error::{Result, SourceError};
pub use loader::SourceLoader;
pub use registry::SourceRegistry;
