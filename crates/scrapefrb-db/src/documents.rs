//! Operations on the `fry6` table.
//!
//! Rows are append-only. The `(rssd_id, year, company)` uniqueness
//! constraint rejects a second copy of a filing instead of overwriting it.

use crate::error::{Result, StoreError};
use chrono::{DateTime, NaiveDateTime, Utc};
use scrapefrb_core::{Document, IdentityKey, PersistedIdentitySet, SourceCode};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::time::Instant;

/// Storage format of the `date` column.
pub const DATE_COLUMN_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Outcome of a batch insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertReport {
    /// Rows written
    pub inserted: usize,
    /// Rows rejected by the uniqueness constraint
    pub rejected: usize,
}

/// A row of the `fry6` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Auto-assigned row id
    pub id: i64,
    /// The filing
    pub document: Document,
    /// Unix seconds of the run that inserted the row
    pub insert_date: f64,
}

/// Append documents, tagging every row with the run timestamp.
///
/// Uniqueness violations are logged and counted per row; any other database
/// error aborts the batch.
pub async fn insert_documents(
    pool: &Pool<Sqlite>,
    documents: &[Document],
    run_started: DateTime<Utc>,
) -> Result<InsertReport> {
    #[allow(clippy::cast_precision_loss)]
    let insert_date = run_started.timestamp_micros() as f64 / 1_000_000.0;
    let mut report = InsertReport::default();
    let start = Instant::now();

    tracing::info!("Inserting {} records", documents.len());

    let mut tx = pool.begin().await?;

    for doc in documents {
        let result = sqlx::query(
            "INSERT INTO fry6 (rssd_id, company, date, year, url, insert_date, source_code)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(doc.rssd_id)
        .bind(&doc.company)
        .bind(doc.filing_date.format(DATE_COLUMN_FORMAT).to_string())
        .bind(doc.filing_year)
        .bind(&doc.url)
        .bind(insert_date)
        .bind(doc.source.as_str())
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => report.inserted += 1,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::warn!(
                    key = %doc.identity_key(),
                    source = %doc.source,
                    "rejected duplicate filing: {}",
                    e.message()
                );
                report.rejected += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit().await?;

    let elapsed = start.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        #[allow(clippy::cast_precision_loss)]
        let rate = report.inserted as f64 / elapsed;
        tracing::info!(
            "Finished batch insert in {:.4} seconds ({:.0} rows/second)",
            elapsed,
            rate
        );
    }

    Ok(report)
}

/// Every identity key currently stored.
pub async fn load_identity_set(pool: &Pool<Sqlite>) -> Result<PersistedIdentitySet> {
    let rows = sqlx::query_as::<_, (i64, String, i32)>("SELECT rssd_id, company, year FROM fry6")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(rssd_id, company, year)| IdentityKey::new(rssd_id, company, year))
        .collect())
}

/// Number of stored rows.
pub async fn count_documents(pool: &Pool<Sqlite>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM fry6")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Every stored row in insertion order.
pub async fn list_documents(pool: &Pool<Sqlite>) -> Result<Vec<StoredDocument>> {
    let rows = sqlx::query_as::<_, (i64, i64, String, String, i32, String, f64, String)>(
        "SELECT id, rssd_id, company, date, year, url, insert_date, source_code
         FROM fry6 ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(
            |(id, rssd_id, company, date, year, url, insert_date, source_code)| {
                let filing_date = NaiveDateTime::parse_from_str(&date, DATE_COLUMN_FORMAT)
                    .map_err(|e| StoreError::Decode(format!("invalid date '{date}' in fry6: {e}")))?;
                let source: SourceCode = source_code.parse().map_err(|_| {
                    StoreError::Decode(format!("invalid source_code '{source_code}' in fry6"))
                })?;

                Ok(StoredDocument {
                    id,
                    document: Document {
                        rssd_id,
                        company,
                        filing_date,
                        filing_year: year,
                        url,
                        source,
                    },
                    insert_date,
                })
            },
        )
        .collect()
}
