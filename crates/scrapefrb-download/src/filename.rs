//! Local file names for downloaded documents.
//!
//! Most document URLs end in a real file name. Some sources serve documents
//! through a dynamic handler (`.../GetDocument.aspx?id=1234`), where the name
//! has to come from the query string or from the response headers.

use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use scrapefrb_core::Document;

/// Extensions of server-side handlers that never name the document itself.
pub const DYNAMIC_EXTENSIONS: [&str; 7] = ["aspx", "ashx", "asp", "cfm", "php", "jsp", "do"];

/// Derives the local file name of a document.
///
/// [`from_url`](FilenameStrategy::from_url) is consulted before any request is
/// made, so existing files can be skipped without touching the network. When
/// it returns `None` the name is derived from the response instead.
pub trait FilenameStrategy: Send + Sync {
    /// Name derived from the document alone.
    fn from_url(&self, document: &Document) -> Option<String>;

    /// Name derived once response headers are available.
    fn from_response(&self, document: &Document, headers: &HeaderMap) -> String;
}

/// Default naming rules.
///
/// 1. The URL's last path segment when it has a static file extension.
/// 2. `<query id>_<source code>.pdf` for dynamic handlers, where the query id
///    is the value of an id-like key (`id`, `docId`, ...) or else every
///    non-empty query value joined with `_`.
/// 3. The `Content-Disposition` file name, then any header value mentioning
///    a `.pdf` file, then `<rssd>_<year>_<source code>.pdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilenameStrategy;

impl FilenameStrategy for DefaultFilenameStrategy {
    fn from_url(&self, document: &Document) -> Option<String> {
        let url = url::Url::parse(&document.url).ok()?;

        let segment = url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(|s| {
                urlencoding::decode(s).map_or_else(|_| s.to_string(), |decoded| decoded.into_owned())
            });

        if let Some(name) = segment.filter(|name| has_static_extension(name)) {
            return Some(sanitize_filename(&name));
        }

        query_id(&url).map(|value| format!("{}_{}.pdf", sanitize_filename(&value), document.source))
    }

    fn from_response(&self, document: &Document, headers: &HeaderMap) -> String {
        headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(content_disposition_filename)
            .or_else(|| pdf_header_filename(headers))
            .map_or_else(
                || {
                    format!(
                        "{}_{}_{}.pdf",
                        document.rssd_id, document.filing_year, document.source
                    )
                },
                |name| sanitize_filename(&name),
            )
    }
}

fn query_id(url: &url::Url) -> Option<String> {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| (key.to_ascii_lowercase(), value.trim().to_string()))
        .filter(|(_, value)| !value.is_empty())
        .collect();

    if let Some((_, value)) = pairs.iter().find(|(key, _)| key.ends_with("id")) {
        return Some(value.clone());
    }

    let joined = pairs
        .into_iter()
        .map(|(_, value)| value)
        .collect::<Vec<_>>()
        .join("_");
    (!joined.is_empty()).then_some(joined)
}

fn has_static_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && !DYNAMIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        None => false,
    }
}

/// Extract the file name from a `Content-Disposition` value.
///
/// `filename*` (RFC 5987) wins over a plain `filename`.
#[must_use]
pub fn content_disposition_filename(value: &str) -> Option<String> {
    let mut plain = None;

    for part in value.split(';').map(str::trim) {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        let raw = raw.trim().trim_matches('"');

        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = raw.rsplit("''").next().unwrap_or(raw);
                if let Ok(decoded) = urlencoding::decode(encoded) {
                    if !decoded.trim().is_empty() {
                        return Some(decoded.into_owned());
                    }
                }
            }
            "filename" if !raw.is_empty() => plain = Some(raw.to_string()),
            _ => {}
        }
    }

    plain
}

/// Any header value mentioning a `.pdf` file: the text after its last `=`.
fn pdf_header_filename(headers: &HeaderMap) -> Option<String> {
    headers
        .values()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.to_ascii_lowercase().contains(".pdf"))
        .and_then(|value| value.rsplit('=').next())
        .map(|name| name.trim().trim_matches(|c: char| c == '"' || c == ';').to_string())
        .filter(|name| !name.is_empty())
}

/// Sanitize a string for use as a file name.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('_').trim_start_matches('.');
    if trimmed.is_empty() {
        "document".to_string()
    } else if trimmed.chars().count() > 150 {
        trimmed.chars().take(150).collect()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reqwest::header::HeaderValue;
    use scrapefrb_core::SourceCode;

    fn doc(url: &str, source: SourceCode) -> Document {
        Document {
            rssd_id: 1_234_567,
            company: "Acme Bancorp".to_string(),
            filing_date: NaiveDate::from_ymd_opt(2013, 3, 28)
                .expect("valid date")
                .and_hms_opt(0, 0, 0)
                .expect("valid time"),
            filing_year: 2012,
            url: url.to_string(),
            source,
        }
    }

    #[test]
    fn test_static_file_name_from_url() {
        let strategy = DefaultFilenameStrategy;
        let name = strategy.from_url(&doc(
            "https://frb.test/fry6/docs/1234567_2012.pdf",
            SourceCode::Atlanta,
        ));
        assert_eq!(name.as_deref(), Some("1234567_2012.pdf"));
    }

    #[test]
    fn test_percent_encoded_segment_is_decoded() {
        let strategy = DefaultFilenameStrategy;
        let name = strategy.from_url(&doc(
            "https://frb.test/files/Acme%20Bancorp%202012.pdf",
            SourceCode::Chicago,
        ));
        assert_eq!(name.as_deref(), Some("Acme Bancorp 2012.pdf"));
    }

    #[test]
    fn test_dynamic_handler_uses_query_value() {
        let strategy = DefaultFilenameStrategy;
        let name = strategy.from_url(&doc(
            "https://frb.test/bsr/y6/GetDocument.aspx?id=98765",
            SourceCode::StLouis,
        ));
        assert_eq!(name.as_deref(), Some("98765_S.pdf"));
    }

    #[test]
    fn test_dynamic_handler_with_several_parameters() {
        let strategy = DefaultFilenameStrategy;
        let first = strategy.from_url(&doc(
            "https://frb.test/bsr/y6/GetDocument.aspx?type=pdf&id=11",
            SourceCode::StLouis,
        ));
        let second = strategy.from_url(&doc(
            "https://frb.test/bsr/y6/GetDocument.aspx?type=pdf&docId=12",
            SourceCode::StLouis,
        ));
        assert_eq!(first.as_deref(), Some("11_S.pdf"));
        assert_eq!(second.as_deref(), Some("12_S.pdf"));

        let unkeyed = strategy.from_url(&doc(
            "https://frb.test/bsr/y6/GetDocument.aspx?type=pdf&n=13",
            SourceCode::StLouis,
        ));
        assert_eq!(unkeyed.as_deref(), Some("pdf_13_S.pdf"));
    }

    #[test]
    fn test_dynamic_handler_without_query_defers() {
        let strategy = DefaultFilenameStrategy;
        assert!(strategy
            .from_url(&doc("https://frb.test/bsr/y6/GetDocument.aspx", SourceCode::StLouis))
            .is_none());
        assert!(strategy
            .from_url(&doc("https://frb.test/bsr/y6/", SourceCode::StLouis))
            .is_none());
    }

    #[test]
    fn test_content_disposition_variants() {
        assert_eq!(
            content_disposition_filename("attachment; filename=\"report.pdf\"").as_deref(),
            Some("report.pdf")
        );
        assert_eq!(
            content_disposition_filename(
                "attachment; filename=\"fallback.pdf\"; filename*=UTF-8''Acme%20Y6.pdf"
            )
            .as_deref(),
            Some("Acme Y6.pdf")
        );
        assert!(content_disposition_filename("inline").is_none());
    }

    #[test]
    fn test_from_response_prefers_content_disposition() {
        let strategy = DefaultFilenameStrategy;
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=Y6_98765.pdf"),
        );
        assert_eq!(
            strategy.from_response(&doc("https://frb.test/x.aspx", SourceCode::StLouis), &headers),
            "Y6_98765.pdf"
        );
    }

    #[test]
    fn test_from_response_pdf_header_heuristic() {
        let strategy = DefaultFilenameStrategy;
        let mut headers = HeaderMap::new();
        headers.insert("x-document", HeaderValue::from_static("name=Acme_2012.pdf"));
        assert_eq!(
            strategy.from_response(&doc("https://frb.test/x.aspx", SourceCode::StLouis), &headers),
            "Acme_2012.pdf"
        );
    }

    #[test]
    fn test_from_response_last_resort() {
        let strategy = DefaultFilenameStrategy;
        assert_eq!(
            strategy.from_response(
                &doc("https://frb.test/x.aspx", SourceCode::StLouis),
                &HeaderMap::new()
            ),
            "1234567_2012_S.pdf"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_filename("a:b*c?.pdf"), "a_b_c_.pdf");
        assert_eq!(sanitize_filename("   "), "document");
    }
}
