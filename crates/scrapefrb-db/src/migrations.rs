//! Embedded schema migrations.

use crate::error::{Result, StoreError};
use sqlx::{Pool, Sqlite};

/// Apply every pending migration from `migrations/`.
///
/// Applied migrations are tracked in `_sqlx_migrations`, so this is safe to
/// call on every open.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    tracing::debug!("Running store migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Migration(format!("migration execution failed: {e}")))?;

    Ok(())
}
