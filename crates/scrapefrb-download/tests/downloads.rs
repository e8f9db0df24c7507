use chrono::NaiveDate;
use scrapefrb_core::{Document, SourceCode};
use scrapefrb_download::DownloadManager;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn document(rssd_id: i64, url: String, source: SourceCode) -> Document {
    Document {
        rssd_id,
        company: "Acme Bancorp".to_string(),
        filing_date: NaiveDate::from_ymd_opt(2013, 3, 28)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time"),
        filing_year: 2012,
        url,
        source,
    }
}

#[tokio::test]
async fn test_downloads_new_file() {
    let server = MockServer::start().await;
    let body = vec![7u8; 20_000];
    Mock::given(method("GET"))
        .and(path("/docs/a.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().expect("create temp dir");
    let manager = DownloadManager::new(reqwest::Client::new(), tmp.path());

    let report = manager
        .download(&[document(
            100,
            format!("{}/docs/a.pdf", server.uri()),
            SourceCode::Atlanta,
        )])
        .await
        .expect("download batch");

    assert_eq!(report.downloaded, 1);
    assert_eq!(report.failed, 0);
    let written = std::fs::read(tmp.path().join("a.pdf")).expect("read downloaded file");
    assert_eq!(written, body);
    assert!(!tmp.path().join("a.pdf.part").exists());
}

#[tokio::test]
async fn test_existing_file_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let tmp = TempDir::new().expect("create temp dir");
    std::fs::write(tmp.path().join("a.pdf"), b"old").expect("write existing file");

    let manager = DownloadManager::new(reqwest::Client::new(), tmp.path());
    let report = manager
        .download(&[document(
            100,
            format!("{}/docs/a.pdf", server.uri()),
            SourceCode::Atlanta,
        )])
        .await
        .expect("download batch");

    assert_eq!(report.skipped_existing, 1);
    assert_eq!(report.downloaded, 0);
    assert_eq!(
        std::fs::read(tmp.path().join("a.pdf")).expect("read existing file"),
        b"old"
    );
}

#[tokio::test]
async fn test_failed_target_does_not_stop_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/b.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-b".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().expect("create temp dir");
    let manager = DownloadManager::new(reqwest::Client::new(), tmp.path());

    let report = manager
        .download(&[
            document(1, format!("{}/docs/missing.pdf", server.uri()), SourceCode::Chicago),
            document(2, format!("{}/docs/b.pdf", server.uri()), SourceCode::Chicago),
        ])
        .await
        .expect("download batch");

    assert_eq!(report.failed, 1);
    assert_eq!(report.downloaded, 1);
    assert!(!tmp.path().join("missing.pdf").exists());
    assert!(tmp.path().join("b.pdf").exists());
}

#[tokio::test]
async fn test_dynamic_handler_named_from_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bsr/y6/GetDocument.aspx"))
        .and(query_param("id", "98765"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-s".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().expect("create temp dir");
    let manager = DownloadManager::new(reqwest::Client::new(), tmp.path());

    let report = manager
        .download(&[document(
            3,
            format!("{}/bsr/y6/GetDocument.aspx?id=98765", server.uri()),
            SourceCode::StLouis,
        )])
        .await
        .expect("download batch");

    assert_eq!(report.downloaded, 1);
    assert!(tmp.path().join("98765_S.pdf").exists());
}

#[tokio::test]
async fn test_name_from_content_disposition() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bsr/y6/GetDocument.aspx"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"Y6_2012_3.pdf\"")
                .set_body_bytes(b"%PDF-cd".to_vec()),
        )
        .expect(2)
        .mount(&server)
        .await;

    let tmp = TempDir::new().expect("create temp dir");
    let manager = DownloadManager::new(reqwest::Client::new(), tmp.path());
    let target = document(
        3,
        format!("{}/bsr/y6/GetDocument.aspx", server.uri()),
        SourceCode::StLouis,
    );

    let first = manager
        .download(std::slice::from_ref(&target))
        .await
        .expect("first batch");
    assert_eq!(first.downloaded, 1);
    assert!(tmp.path().join("Y6_2012_3.pdf").exists());

    // The name is only known after the response, so the request is repeated
    // but the existing file is kept.
    let second = manager
        .download(std::slice::from_ref(&target))
        .await
        .expect("second batch");
    assert_eq!(second.skipped_existing, 1);
}

#[tokio::test]
async fn test_handler_targets_sharing_parameters_get_distinct_names() {
    let server = MockServer::start().await;
    for id in ["21", "22"] {
        Mock::given(method("GET"))
            .and(path("/bsr/y6/GetDocument.aspx"))
            .and(query_param("id", id))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("%PDF-{id}")))
            .expect(1)
            .mount(&server)
            .await;
    }

    let tmp = TempDir::new().expect("create temp dir");
    let manager = DownloadManager::new(reqwest::Client::new(), tmp.path());
    let targets: Vec<Document> = [21, 22]
        .into_iter()
        .map(|id| {
            document(
                id,
                format!("{}/bsr/y6/GetDocument.aspx?type=pdf&id={id}", server.uri()),
                SourceCode::StLouis,
            )
        })
        .collect();

    let report = manager.download(&targets).await.expect("download batch");

    assert_eq!(report.downloaded, 2);
    assert_eq!(report.skipped_existing, 0);
    assert_eq!(
        std::fs::read(tmp.path().join("22_S.pdf")).expect("read second file"),
        b"%PDF-22"
    );
}
