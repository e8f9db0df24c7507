//! Turns a [`ScrapedTable`] into typed [`Document`]s.
//!
//! Each canonical field resolves to the first table header (in table order)
//! containing one of the source's declared variants, case-insensitively.

use crate::error::NormalizeError;
use crate::table::ScrapedTable;
use scrapefrb_core::{
    collapse_whitespace, parse_filing_date, parse_integer_like, Document, SourceCode,
};
use scrapefrb_source::{CanonicalField, HeaderMap, SourceDefinition};
use std::collections::HashMap;

/// Header names resolved for each canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeaders {
    rssd: String,
    name: String,
    date: String,
    year: String,
    url: String,
}

impl ResolvedHeaders {
    /// The header backing `field`.
    #[must_use]
    pub fn get(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::Rssd => &self.rssd,
            CanonicalField::Name => &self.name,
            CanonicalField::Date => &self.date,
            CanonicalField::Year => &self.year,
            CanonicalField::Url => &self.url,
        }
    }
}

/// Resolve every canonical field against `headers`.
pub fn resolve_headers(
    source_code: SourceCode,
    map: &HeaderMap,
    headers: &[String],
) -> Result<ResolvedHeaders, NormalizeError> {
    let resolve = |field: CanonicalField| -> Result<String, NormalizeError> {
        let variants: Vec<String> = map
            .variants(field)
            .iter()
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .collect();

        headers
            .iter()
            .find(|header| {
                let header = header.to_lowercase();
                variants.iter().any(|variant| header.contains(variant))
            })
            .cloned()
            .ok_or_else(|| NormalizeError::UnresolvedHeader {
                source_code,
                field,
                headers: headers.to_vec(),
            })
    };

    Ok(ResolvedHeaders {
        rssd: resolve(CanonicalField::Rssd)?,
        name: resolve(CanonicalField::Name)?,
        date: resolve(CanonicalField::Date)?,
        year: resolve(CanonicalField::Year)?,
        url: resolve(CanonicalField::Url)?,
    })
}

/// Normalize every row of `table` for the source `definition` describes.
///
/// Rows whose RSSD or year is not an integer are dropped with a warning.
///
/// # Errors
/// `UnresolvedHeader` when the table lacks a canonical field; `InvalidDate`
/// on the first unparseable date.
pub fn normalize(
    definition: &SourceDefinition,
    table: &ScrapedTable,
) -> Result<Vec<Document>, NormalizeError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }

    let source_code = definition.code();
    let resolved = resolve_headers(source_code, &definition.headers, table.headers())?;
    let date_format = definition.source.date_format.as_str();

    let mut documents = Vec::with_capacity(table.len());
    for row in table.rows() {
        match normalize_row(source_code, &resolved, date_format, row) {
            Ok(document) => documents.push(document),
            Err(e @ NormalizeError::InvalidInteger { .. }) => {
                tracing::warn!(source = %source_code, error = %e, "dropping row");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(documents)
}

fn normalize_row(
    source_code: SourceCode,
    resolved: &ResolvedHeaders,
    date_format: &str,
    row: &HashMap<String, String>,
) -> Result<Document, NormalizeError> {
    let cell = |field: CanonicalField| {
        row.get(resolved.get(field))
            .map(|value| collapse_whitespace(value))
            .unwrap_or_default()
    };

    let rssd_raw = cell(CanonicalField::Rssd);
    let rssd_id = parse_integer_like(&rssd_raw).ok_or_else(|| NormalizeError::InvalidInteger {
        source_code,
        column: resolved.rssd.clone(),
        value: rssd_raw.clone(),
    })?;

    let year_raw = cell(CanonicalField::Year);
    let filing_year = parse_integer_like(&year_raw)
        .and_then(|year| i32::try_from(year).ok())
        .ok_or_else(|| NormalizeError::InvalidInteger {
            source_code,
            column: resolved.year.clone(),
            value: year_raw.clone(),
        })?;

    let date_raw = cell(CanonicalField::Date);
    let filing_date =
        parse_filing_date(&date_raw, date_format).map_err(|_| NormalizeError::InvalidDate {
            source_code,
            value: date_raw.clone(),
            format: date_format.to_string(),
        })?;

    Ok(Document {
        rssd_id,
        company: cell(CanonicalField::Name),
        filing_date,
        filing_year,
        url: cell(CanonicalField::Url),
        source: source_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapefrb_source::SourceRegistry;

    fn table(headers: &[&str], rows: &[&[&str]]) -> ScrapedTable {
        let headers: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
        let mut table = ScrapedTable::new();
        for row in rows {
            let record = headers
                .iter()
                .cloned()
                .zip(row.iter().map(|v| (*v).to_string()))
                .collect();
            table.push_row(record, &headers);
        }
        table
    }

    fn definition(code: SourceCode) -> SourceDefinition {
        SourceRegistry::builtin()
            .expect("builtin definitions")
            .get(code)
            .expect("definition")
    }

    #[test]
    fn test_atlanta_row() {
        let table = table(
            &["DOCRSSD", "DOCINSTNAME", "FILEDATE", "DOCYEAR", "FILENAME", "URL"],
            &[&[
                "1234567.0",
                "  Acme\n  Bancorp ",
                "March, 28 2013 14:05:00",
                "2012",
                "acme.pdf",
                "https://example.test/acme.pdf",
            ]],
        );

        let docs = normalize(&definition(SourceCode::Atlanta), &table).expect("normalize");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].rssd_id, 1_234_567);
        assert_eq!(docs[0].company, "Acme Bancorp");
        assert_eq!(docs[0].filing_year, 2012);
        assert_eq!(
            docs[0].filing_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2013-03-28T14:05:00"
        );
        assert_eq!(docs[0].source, SourceCode::Atlanta);
    }

    #[test]
    fn test_header_resolution_is_substring_and_case_insensitive() {
        let table = table(
            &["rssd id", "Institution Name", "Posting Date", "Report YEAR", "url"],
            &[&["42", "Beta Financial", "06/01/2013", "2012", "https://example.test/b.pdf"]],
        );

        let docs = normalize(&definition(SourceCode::StLouis), &table).expect("normalize");
        assert_eq!(docs[0].rssd_id, 42);
        assert_eq!(docs[0].company, "Beta Financial");
    }

    #[test]
    fn test_unresolved_header_is_not_fatal() {
        let table = table(&["Something", "Else"], &[&["1", "2"]]);

        let err = normalize(&definition(SourceCode::Chicago), &table).expect_err("unresolved");
        assert!(matches!(
            err,
            NormalizeError::UnresolvedHeader { field: CanonicalField::Rssd, .. }
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_bad_date_is_fatal() {
        let table = table(
            &["ID RSSD", "File name", "Date file was posted", "Report Year", "URL"],
            &[&["1", "Acme", "not a date", "2012", "u"]],
        );

        let err = normalize(&definition(SourceCode::Chicago), &table).expect_err("bad date");
        assert!(matches!(err, NormalizeError::InvalidDate { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_bad_integer_drops_only_that_row() {
        let table = table(
            &["RSSD", "Institution", "Date", "Year", "URL"],
            &[
                &["1001", "Acme", "03/28/2013", "2012", "u1"],
                &["", "Blank Bank", "03/28/2013", "2012", "u2"],
                &["12.5", "Half Bank", "03/28/2013", "2012", "u3"],
                &["1004", "Yearless", "03/28/2013", "n/a", "u4"],
                &["1005", "Beta", "03/29/2013", "2012", "u5"],
            ],
        );

        let docs = normalize(&definition(SourceCode::StLouis), &table).expect("normalize");
        let rssds: Vec<i64> = docs.iter().map(|d| d.rssd_id).collect();
        assert_eq!(rssds, vec![1001, 1005]);
    }

    #[test]
    fn test_only_dates_are_fatal() {
        let integer = NormalizeError::InvalidInteger {
            source_code: SourceCode::StLouis,
            column: "RSSD".to_string(),
            value: String::new(),
        };
        assert!(!integer.is_fatal());
    }

    #[test]
    fn test_empty_table() {
        let docs = normalize(&definition(SourceCode::Atlanta), &ScrapedTable::new())
            .expect("normalize");
        assert!(docs.is_empty());
    }
}
