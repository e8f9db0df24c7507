//! Store error types.

use thiserror::Error;

/// Store-specific errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open or create the database file.
    #[error("failed to open store: {0}")]
    Open(String),

    /// Migration execution failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// Failed to decode a stored value.
    #[error("decode error: {0}")]
    Decode(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
