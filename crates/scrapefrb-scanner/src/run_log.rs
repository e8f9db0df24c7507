//! CSV log of every document scraped in a run.

use crate::error::{Result, ScanError};
use scrapefrb_core::Document;
use std::path::Path;

/// Column header of the run log.
pub const RUN_LOG_HEADER: [&str; 6] = ["RSSD", "Name", "Date", "Year", "URL", "Source"];

/// Write `documents` in discovery order to a new CSV file at `path`.
///
/// The header row is written even when `documents` is empty.
pub fn write_run_log(path: &Path, documents: &[Document]) -> Result<()> {
    let wrap = |source: csv::Error| ScanError::RunLog {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(wrap)?;

    writer.write_record(RUN_LOG_HEADER).map_err(wrap)?;
    for document in documents {
        writer.serialize(document).map_err(wrap)?;
    }
    writer.flush().map_err(|e| wrap(e.into()))?;

    tracing::debug!(path = %path.display(), rows = documents.len(), "wrote run log");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use scrapefrb_core::SourceCode;
    use tempfile::TempDir;

    #[test]
    fn test_run_log_rows() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("fry6-20131104-083015.csv");
        let documents = vec![Document {
            rssd_id: 1_234_567,
            company: "Acme, Bancorp".to_string(),
            filing_date: NaiveDate::from_ymd_opt(2013, 3, 28)
                .expect("valid date")
                .and_hms_opt(0, 0, 0)
                .expect("valid time"),
            filing_year: 2012,
            url: "https://example.test/acme.pdf".to_string(),
            source: SourceCode::Chicago,
        }];

        write_run_log(&path, &documents).expect("write run log");

        let contents = std::fs::read_to_string(&path).expect("read run log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "RSSD,Name,Date,Year,URL,Source");
        assert_eq!(
            lines[1],
            "1234567,\"Acme, Bancorp\",2013-03-28T00:00:00,2012,https://example.test/acme.pdf,C"
        );
    }

    #[test]
    fn test_empty_run_log_has_header() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("empty.csv");

        write_run_log(&path, &[]).expect("write run log");

        let contents = std::fs::read_to_string(&path).expect("read run log");
        assert_eq!(contents.trim_end(), "RSSD,Name,Date,Year,URL,Source");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("missing").join("run.csv");

        let err = write_run_log(&path, &[]).expect_err("no parent directory");
        assert!(matches!(err, ScanError::RunLog { .. }));
    }
}
