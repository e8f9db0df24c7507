//! scrapefrb Database Layer
//!
//! Durable record of every FR Y-6 filing seen by earlier runs, kept in a
//! `SQLite` file (`frb_files.db`) with embedded `SQLx` migrations.
//!
//! # Example
//!
//! ```ignore
//! use scrapefrb_db::PersistentStore;
//!
//! let store = PersistentStore::open("frb_files.db").await?;
//! let known = store.load_identity_set().await?;
//! println!("{} filings already recorded", known.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod documents;
pub mod error;
pub mod migrations;

// Re-export commonly used types
pub use connection::StorePool;
pub use documents::{InsertReport, StoredDocument};
pub use error::{Result, StoreError};

use chrono::{DateTime, Utc};
use scrapefrb_core::{Document, PersistedIdentitySet};
use std::path::Path;

/// High-level store interface: opening the file applies migrations.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    pool: StorePool,
}

impl PersistentStore {
    /// Open the store at `path`, creating the file and schema if missing.
    ///
    /// # Errors
    /// Returns `StoreError` if the file cannot be opened or migrated.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = StorePool::new(path).await?;
        migrations::run_migrations(pool.pool()).await?;
        Ok(Self { pool })
    }

    /// Append documents with the run timestamp.
    ///
    /// A row whose identity key is already stored is rejected and logged;
    /// the rest of the batch still goes in.
    pub async fn insert(
        &self,
        documents: &[Document],
        run_started: DateTime<Utc>,
    ) -> Result<InsertReport> {
        documents::insert_documents(self.pool.pool(), documents, run_started).await
    }

    /// Identity keys of every stored row.
    pub async fn load_identity_set(&self) -> Result<PersistedIdentitySet> {
        documents::load_identity_set(self.pool.pool()).await
    }

    /// Number of stored rows.
    pub async fn count(&self) -> Result<i64> {
        documents::count_documents(self.pool.pool()).await
    }

    /// Stored rows ordered by id.
    pub async fn list(&self) -> Result<Vec<StoredDocument>> {
        documents::list_documents(self.pool.pool()).await
    }

    /// Close the store gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
