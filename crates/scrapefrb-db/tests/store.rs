use chrono::{NaiveDate, TimeZone, Utc};
use scrapefrb_core::{Document, IdentityKey, SourceCode};
use scrapefrb_db::PersistentStore;
use tempfile::TempDir;

fn document(rssd_id: i64, company: &str, year: i32, url: &str) -> Document {
    Document {
        rssd_id,
        company: company.to_string(),
        filing_date: NaiveDate::from_ymd_opt(year + 1, 3, 28)
            .expect("valid date")
            .and_hms_opt(14, 5, 0)
            .expect("valid time"),
        filing_year: year,
        url: url.to_string(),
        source: SourceCode::Chicago,
    }
}

#[tokio::test]
async fn test_open_creates_file() {
    let tmp = TempDir::new().expect("create temp dir");
    let path = tmp.path().join("frb_files.db");

    let store = PersistentStore::open(&path).await.expect("open store");
    assert!(path.exists());
    assert_eq!(store.count().await.expect("count rows"), 0);
    assert!(store
        .load_identity_set()
        .await
        .expect("load identity set")
        .is_empty());
}

#[tokio::test]
async fn test_duplicate_identity_is_rejected() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = PersistentStore::open(tmp.path().join("frb_files.db"))
        .await
        .expect("open store");
    let run = Utc
        .with_ymd_and_hms(2013, 11, 4, 8, 0, 0)
        .single()
        .expect("valid timestamp");

    let first = document(123, "ABC Corp", 2012, "https://frb.test/one.pdf");
    let second = document(123, "ABC Corp", 2012, "https://frb.test/two.pdf");

    let report = store
        .insert(&[first.clone(), second], run)
        .await
        .expect("insert batch");

    assert_eq!(report.inserted, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(store.count().await.expect("count rows"), 1);

    let rows = store.list().await.expect("list rows");
    assert_eq!(rows[0].document, first);
}

#[tokio::test]
async fn test_rejection_does_not_abort_batch() {
    let store = PersistentStore::open(":memory:").await.expect("open store");
    let run = Utc::now();

    store
        .insert(&[document(1, "Acme Bancorp", 2012, "https://frb.test/a.pdf")], run)
        .await
        .expect("first insert");

    let report = store
        .insert(
            &[
                document(1, "Acme Bancorp", 2012, "https://frb.test/a.pdf"),
                document(2, "Beta Holdings", 2012, "https://frb.test/b.pdf"),
                document(1, "Acme Bancorp", 2013, "https://frb.test/c.pdf"),
            ],
            run,
        )
        .await
        .expect("second insert");

    assert_eq!(report.inserted, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(store.count().await.expect("count rows"), 3);
}

#[tokio::test]
async fn test_rows_round_trip_through_reopen() {
    let tmp = TempDir::new().expect("create temp dir");
    let path = tmp.path().join("frb_files.db");
    let run = Utc
        .with_ymd_and_hms(2013, 11, 4, 8, 30, 15)
        .single()
        .expect("valid timestamp");

    let mut atlanta = document(100, "Acme Bancorp", 2012, "https://frb.test/a.pdf");
    atlanta.source = SourceCode::Atlanta;

    {
        let store = PersistentStore::open(&path).await.expect("open store");
        store.insert(&[atlanta.clone()], run).await.expect("insert");
        store.close().await;
    }

    let store = PersistentStore::open(&path).await.expect("reopen store");
    let rows = store.list().await.expect("list rows");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 1);
    assert_eq!(rows[0].document, atlanta);
    assert!((rows[0].insert_date - 1_383_553_815.0).abs() < 1e-6);

    let known = store.load_identity_set().await.expect("load identity set");
    assert!(known.contains(&IdentityKey::new(100, "Acme Bancorp", 2012)));
}
