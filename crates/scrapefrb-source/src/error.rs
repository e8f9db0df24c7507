//! Error types for the source definition subsystem.

use thiserror::Error;

/// Errors that can occur while loading or querying source definitions.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Source definition not found
    #[error("source definition not found: {source_code}")]
    NotFound {
        /// The source code that was not found
        source_code: String,
    },

    /// Failed to read a source definition file
    #[error("failed to load source definition from {path}: {source}")]
    LoadError {
        /// Path to the definition file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse source definition TOML
    #[error("failed to parse source definition TOML in {path}: {source}")]
    ParseError {
        /// Path (or built-in name) of the definition
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Invalid source definition (validation failed)
    #[error("invalid source definition for {source_code}: {reason}")]
    ValidationError {
        /// Source code being validated
        source_code: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Source definition directory not found
    #[error("source definitions directory not found at {path}")]
    DirectoryNotFound {
        /// Expected directory path
        path: String,
    },

    /// I/O error while accessing source definitions
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for source definition operations.
pub type Result<T> = std::result::Result<T, SourceError>;
