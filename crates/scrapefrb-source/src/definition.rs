//! Source definition types and structures.
//!
//! A source definition describes one remote site: where it lives, how its
//! dates are formatted, which scraping strategy reaches its listings, and
//! which of its column headers carry each canonical document field.

use crate::error::{Result, SourceError};
use chrono::format::{Item, StrftimeItems};
use scrapefrb_core::SourceCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default cap on postback rounds for the pager strategy.
pub const DEFAULT_MAX_ROUNDS: u32 = 500;

/// Complete source definition loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Static site metadata
    pub source: SourceDescriptor,

    /// How listings are reached and parsed
    pub strategy: ScraperStrategy,

    /// Accepted header variants per canonical field
    pub headers: HeaderMap,
}

impl SourceDefinition {
    /// Get the source code.
    #[must_use]
    pub fn code(&self) -> SourceCode {
        self.source.code
    }

    /// Get the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.source.name
    }

    /// Validate the definition for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        let code = self.source.code;

        if self.source.name.trim().is_empty() {
            return Err(invalid(code, "source name cannot be empty"));
        }

        check_url(code, "base_url", &self.source.base_url)?;

        if let Some(prefix) = &self.source.doc_prefix {
            check_url(code, "doc_prefix", prefix)?;
        }

        if self.source.date_format.trim().is_empty()
            || StrftimeItems::new(&self.source.date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(invalid(
                code,
                &format!("invalid date format '{}'", self.source.date_format),
            ));
        }

        self.strategy.validate(code)?;

        if matches!(self.strategy, ScraperStrategy::PagedJson { .. })
            && self.source.doc_prefix.is_none()
        {
            return Err(invalid(code, "paged-json sources require a doc_prefix"));
        }

        self.headers.validate(code)
    }
}

/// Static configuration of a source site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Short source code (`A`, `C`, `S`)
    pub code: SourceCode,

    /// Human-readable site name
    pub name: String,

    /// Base URL of the listing page or endpoint
    pub base_url: String,

    /// chrono `strftime` format of the filing dates published by the site
    pub date_format: String,

    /// Prefix prepended to relative document file names
    #[serde(default)]
    pub doc_prefix: Option<String>,
}

/// Scraping strategy for a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScraperStrategy {
    /// JSON reader endpoint queried once for the year list, then once per year
    PagedJson {
        /// URL returning a JSON array of years
        year_list_url: String,
        /// URL returning a year's listing; `{year}` is substituted
        docs_url_template: String,
        /// Column holding the document file name
        #[serde(default = "default_filename_column")]
        filename_column: String,
        /// Key of the column-name array in a listing response
        #[serde(default = "default_columns_key")]
        columns_key: String,
        /// Key of the row array in a listing response
        #[serde(default = "default_rows_key")]
        rows_key: String,
    },

    /// Static HTML table, one page per year selected through query parameters
    StaticTable {
        /// Text inside a `<b>` element ending with the displayed year
        current_year_marker: String,
        /// Leading text of the `<td>` whose children list the selectable years
        year_selector_marker: String,
        /// `for` attribute values of the labels that mark listing cells
        cell_roles: Vec<String>,
        /// Name of the synthetic column carrying the page's year
        #[serde(default = "default_year_column")]
        year_column: String,
        /// Query parameter naming the year the page is requested from
        #[serde(default = "default_current_year_param")]
        current_year_param: String,
        /// Query parameter naming the year to display
        #[serde(default = "default_display_year_param")]
        display_year_param: String,
        /// Extra query parameters sent with every year request
        #[serde(default)]
        fixed_params: BTreeMap<String, String>,
    },

    /// Paged HTML table driven by form postbacks carrying hidden state
    PostbackPager {
        /// Substring identifying hidden framework fields to echo back
        #[serde(default = "default_hidden_field_marker")]
        hidden_field_marker: String,
        /// Selector of the header cells
        #[serde(default = "default_header_selector")]
        header_selector: String,
        /// Selector of the listing rows
        #[serde(default = "default_row_selector")]
        row_selector: String,
        /// Selector of the anchor holding a row's document link
        preview_selector: String,
        /// Selector of the pager region
        pager_selector: String,
        /// Class of the `<span>` marking the current page inside the pager
        current_page_class: String,
        /// Substring identifying usable postback targets in pager links
        listing_marker: String,
        /// Form field carrying the postback target
        #[serde(default = "default_event_target_field")]
        event_target_field: String,
        /// Form field carrying the postback argument
        #[serde(default = "default_event_argument_field")]
        event_argument_field: String,
        /// Explicit `Host` header sent with every request
        #[serde(default)]
        host_header: Option<String>,
        /// Maximum number of page requests
        #[serde(default = "default_max_rounds")]
        max_rounds: u32,
    },
}

impl ScraperStrategy {
    /// Short strategy name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PagedJson { .. } => "paged-json",
            Self::StaticTable { .. } => "static-table",
            Self::PostbackPager { .. } => "postback-pager",
        }
    }

    fn validate(&self, code: SourceCode) -> Result<()> {
        match self {
            Self::PagedJson {
                year_list_url,
                docs_url_template,
                filename_column,
                columns_key,
                rows_key,
            } => {
                check_url(code, "year_list_url", year_list_url)?;
                if !docs_url_template.contains("{year}") {
                    return Err(invalid(
                        code,
                        "docs_url_template must contain a {year} placeholder",
                    ));
                }
                check_url(code, "docs_url_template", &docs_url_template.replace("{year}", "2000"))?;
                require_non_blank(
                    code,
                    &[
                        ("filename_column", filename_column),
                        ("columns_key", columns_key),
                        ("rows_key", rows_key),
                    ],
                )
            }
            Self::StaticTable {
                current_year_marker,
                year_selector_marker,
                cell_roles,
                year_column,
                current_year_param,
                display_year_param,
                ..
            } => {
                if cell_roles.iter().all(|role| role.trim().is_empty()) {
                    return Err(invalid(code, "static-table requires at least one cell role"));
                }
                require_non_blank(
                    code,
                    &[
                        ("current_year_marker", current_year_marker),
                        ("year_selector_marker", year_selector_marker),
                        ("year_column", year_column),
                        ("current_year_param", current_year_param),
                        ("display_year_param", display_year_param),
                    ],
                )
            }
            Self::PostbackPager {
                hidden_field_marker,
                header_selector,
                row_selector,
                preview_selector,
                pager_selector,
                current_page_class,
                listing_marker,
                event_target_field,
                event_argument_field,
                max_rounds,
                ..
            } => {
                if *max_rounds == 0 {
                    return Err(invalid(code, "max_rounds must be at least 1"));
                }
                require_non_blank(
                    code,
                    &[
                        ("hidden_field_marker", hidden_field_marker),
                        ("header_selector", header_selector),
                        ("row_selector", row_selector),
                        ("preview_selector", preview_selector),
                        ("pager_selector", pager_selector),
                        ("current_page_class", current_page_class),
                        ("listing_marker", listing_marker),
                        ("event_target_field", event_target_field),
                        ("event_argument_field", event_argument_field),
                    ],
                )
            }
        }
    }
}

/// Canonical document fields a source header can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    /// RSSD identifier
    Rssd,
    /// Company name
    Name,
    /// Filing date
    Date,
    /// Filing year
    Year,
    /// Document URL
    Url,
}

impl CanonicalField {
    /// Every canonical field.
    pub const ALL: [CanonicalField; 5] =
        [Self::Rssd, Self::Name, Self::Date, Self::Year, Self::Url];

    /// Key used in the `[headers]` table.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rssd => "rssd",
            Self::Name => "name",
            Self::Date => "date",
            Self::Year => "year",
            Self::Url => "url",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted source header variants per canonical field.
///
/// A header matches a field when it contains one of the variants,
/// compared case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderMap {
    /// Variants for the RSSD column
    pub rssd: Vec<String>,
    /// Variants for the company name column
    pub name: Vec<String>,
    /// Variants for the filing date column
    pub date: Vec<String>,
    /// Variants for the filing year column
    pub year: Vec<String>,
    /// Variants for the URL column
    pub url: Vec<String>,
}

impl HeaderMap {
    /// Accepted variants for one canonical field.
    #[must_use]
    pub fn variants(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Rssd => &self.rssd,
            CanonicalField::Name => &self.name,
            CanonicalField::Date => &self.date,
            CanonicalField::Year => &self.year,
            CanonicalField::Url => &self.url,
        }
    }

    fn validate(&self, code: SourceCode) -> Result<()> {
        for field in CanonicalField::ALL {
            if self.variants(field).iter().all(|v| v.trim().is_empty()) {
                return Err(invalid(
                    code,
                    &format!("headers.{field} needs at least one non-blank variant"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(code: SourceCode, reason: &str) -> SourceError {
    SourceError::ValidationError {
        source_code: code.to_string(),
        reason: reason.to_string(),
    }
}

fn check_url(code: SourceCode, field: &str, raw: &str) -> Result<()> {
    url::Url::parse(raw)
        .map(|_| ())
        .map_err(|e| invalid(code, &format!("{field} is not a valid URL ({e}): {raw}")))
}

fn require_non_blank(code: SourceCode, fields: &[(&str, &String)]) -> Result<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(invalid(code, &format!("{name} cannot be empty")));
        }
    }
    Ok(())
}

fn default_filename_column() -> String {
    "FILENAME".to_string()
}

fn default_columns_key() -> String {
    "COLUMNS".to_string()
}

fn default_rows_key() -> String {
    "DATA".to_string()
}

fn default_year_column() -> String {
    "Report Year".to_string()
}

fn default_current_year_param() -> String {
    "CurrentYear".to_string()
}

fn default_display_year_param() -> String {
    "DisplayYear".to_string()
}

fn default_hidden_field_marker() -> String {
    "__".to_string()
}

fn default_header_selector() -> String {
    "table th".to_string()
}

fn default_row_selector() -> String {
    "table tr".to_string()
}

fn default_event_target_field() -> String {
    "__EVENTTARGET".to_string()
}

fn default_event_argument_field() -> String {
    "__EVENTARGUMENT".to_string()
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> HeaderMap {
        HeaderMap {
            rssd: vec!["RSSD".to_string()],
            name: vec!["Name".to_string()],
            date: vec!["Date".to_string()],
            year: vec!["Year".to_string()],
            url: vec!["URL".to_string()],
        }
    }

    fn paged_json() -> SourceDefinition {
        SourceDefinition {
            source: SourceDescriptor {
                code: SourceCode::Atlanta,
                name: "Test Reader".to_string(),
                base_url: "https://reader.test/reader.cfm".to_string(),
                date_format: "%B, %d %Y %H:%M:%S".to_string(),
                doc_prefix: Some("https://reader.test/docs/".to_string()),
            },
            strategy: ScraperStrategy::PagedJson {
                year_list_url: "https://reader.test/years".to_string(),
                docs_url_template: "https://reader.test/docs?year={year}".to_string(),
                filename_column: default_filename_column(),
                columns_key: default_columns_key(),
                rows_key: default_rows_key(),
            },
            headers: headers(),
        }
    }

    #[test]
    fn test_valid_definition() {
        assert!(paged_json().validate().is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut def = paged_json();
        def.source.name = "  ".to_string();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_bad_date_format_rejected() {
        let mut def = paged_json();
        def.source.date_format = "%Q/%d".to_string();
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_missing_year_placeholder_rejected() {
        let mut def = paged_json();
        def.strategy = ScraperStrategy::PagedJson {
            year_list_url: "https://reader.test/years".to_string(),
            docs_url_template: "https://reader.test/docs".to_string(),
            filename_column: default_filename_column(),
            columns_key: default_columns_key(),
            rows_key: default_rows_key(),
        };
        let err = def.validate().expect_err("template without placeholder");
        assert!(err.to_string().contains("{year}"));
    }

    #[test]
    fn test_paged_json_requires_doc_prefix() {
        let mut def = paged_json();
        def.source.doc_prefix = None;
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_blank_header_variants_rejected() {
        let mut def = paged_json();
        def.headers.date = vec![String::new()];
        let err = def.validate().expect_err("blank date variants");
        assert!(err.to_string().contains("headers.date"));
    }

    #[test]
    fn test_postback_defaults_from_toml() {
        let strategy: ScraperStrategy = toml::from_str(
            r##"
kind = "postback-pager"
preview_selector = "a.previewLink"
pager_selector = "#searchResultsPager"
current_page_class = "currentSearchPage"
listing_marker = "SearchData"
"##,
        )
        .expect("parse postback strategy");

        match &strategy {
            ScraperStrategy::PostbackPager {
                hidden_field_marker,
                max_rounds,
                event_target_field,
                host_header,
                ..
            } => {
                assert_eq!(hidden_field_marker, "__");
                assert_eq!(*max_rounds, DEFAULT_MAX_ROUNDS);
                assert_eq!(event_target_field, "__EVENTTARGET");
                assert!(host_header.is_none());
            }
            other => panic!("unexpected strategy {other:?}"),
        }
        assert!(strategy.validate(SourceCode::StLouis).is_ok());
    }

    #[test]
    fn test_zero_max_rounds_rejected() {
        let strategy: ScraperStrategy = toml::from_str(
            r##"
kind = "postback-pager"
preview_selector = "a.previewLink"
pager_selector = "#searchResultsPager"
current_page_class = "currentSearchPage"
listing_marker = "SearchData"
max_rounds = 0
"##,
        )
        .expect("parse postback strategy");
        assert!(strategy.validate(SourceCode::StLouis).is_err());
    }

    #[test]
    fn test_header_variants_lookup() {
        let map = headers();
        assert_eq!(map.variants(CanonicalField::Rssd), ["RSSD".to_string()]);
        assert_eq!(CanonicalField::Url.to_string(), "url");
    }
}
