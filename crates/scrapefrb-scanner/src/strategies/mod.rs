//! Scraper variants, one per listing layout.
//!
//! A [`SourceScraper`] is built from a [`SourceDefinition`] and produces a
//! [`ScrapedTable`]. Network failures inside a scrape are logged and leave
//! the rows gathered so far; only configuration problems surface as errors.

pub mod pager;
pub mod paged_json;
pub mod postback;
pub mod static_table;

pub use pager::{PageRequest, PagerState, PaginationState, PaginationStateMachine};
pub use paged_json::PagedJsonScraper;
pub use postback::PostbackScraper;
pub use static_table::StaticTableScraper;

use crate::error::{Result, ScanError};
use crate::fetch::HttpFetcher;
use crate::table::ScrapedTable;
use postback::PostbackConfig;
use scrapefrb_core::{collapse_whitespace, SourceCode};
use scrapefrb_source::{ScraperStrategy, SourceDefinition, SourceError};
use scraper::{ElementRef, Selector};
use url::Url;

/// A scraper ready to run against one source.
#[derive(Debug, Clone)]
pub enum SourceScraper {
    /// JSON reader with a year list.
    PagedJson(PagedJsonScraper),
    /// One static HTML page per year.
    StaticTable(StaticTableScraper),
    /// Postback-paged HTML table.
    PostbackPager(PostbackScraper),
}

impl SourceScraper {
    /// Build the scraper a definition describes.
    ///
    /// `max_rounds_override` replaces the definition's pager round cap.
    pub fn from_definition(
        definition: &SourceDefinition,
        max_rounds_override: Option<u32>,
    ) -> Result<Self> {
        let code = definition.code();
        let name = definition.name().to_string();
        let base_url = parse_url(&definition.source.base_url)?;

        let scraper = match &definition.strategy {
            ScraperStrategy::PagedJson {
                year_list_url,
                docs_url_template,
                filename_column,
                columns_key,
                rows_key,
            } => {
                let doc_prefix = definition.source.doc_prefix.clone().ok_or_else(|| {
                    missing(code, "paged-json sources require a doc_prefix")
                })?;
                Self::PagedJson(PagedJsonScraper {
                    name,
                    year_list_url: year_list_url.clone(),
                    docs_url_template: docs_url_template.clone(),
                    doc_prefix,
                    filename_column: filename_column.clone(),
                    columns_key: columns_key.clone(),
                    rows_key: rows_key.clone(),
                })
            }
            ScraperStrategy::StaticTable {
                current_year_marker,
                year_selector_marker,
                cell_roles,
                year_column,
                current_year_param,
                display_year_param,
                fixed_params,
            } => Self::StaticTable(StaticTableScraper {
                name,
                base_url,
                current_year_marker: current_year_marker.clone(),
                year_selector_marker: year_selector_marker.clone(),
                cell_roles: cell_roles.clone(),
                year_column: year_column.clone(),
                current_year_param: current_year_param.clone(),
                display_year_param: display_year_param.clone(),
                fixed_params: fixed_params.clone(),
            }),
            ScraperStrategy::PostbackPager {
                hidden_field_marker,
                header_selector,
                row_selector,
                preview_selector,
                pager_selector,
                current_page_class,
                listing_marker,
                event_target_field,
                event_argument_field,
                host_header,
                max_rounds,
            } => Self::PostbackPager(PostbackScraper::new(PostbackConfig {
                name: &name,
                base_url,
                hidden_field_marker,
                header_selector,
                row_selector,
                preview_selector,
                pager_selector,
                current_page_class,
                listing_marker,
                event_target_field,
                event_argument_field,
                host_header: host_header.as_deref(),
                max_rounds: max_rounds_override.unwrap_or(*max_rounds),
            })?),
        };

        Ok(scraper)
    }

    /// Strategy name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PagedJson(_) => "paged-json",
            Self::StaticTable(_) => "static-table",
            Self::PostbackPager(_) => "postback-pager",
        }
    }

    /// Gather every listing row the source publishes.
    pub async fn scrape(&self, fetcher: &HttpFetcher) -> Result<ScrapedTable> {
        match self {
            Self::PagedJson(scraper) => Ok(scraper.scrape(fetcher).await),
            Self::StaticTable(scraper) => scraper.scrape(fetcher).await,
            Self::PostbackPager(scraper) => Ok(scraper.scrape(fetcher).await),
        }
    }
}

fn missing(code: SourceCode, reason: &str) -> ScanError {
    ScanError::Source(SourceError::ValidationError {
        source_code: code.to_string(),
        reason: reason.to_string(),
    })
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| ScanError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Element children, skipping text and comment nodes.
pub(crate) fn child_elements<'a>(
    element: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}

/// All descendant text, whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// The element's first child when it is non-blank text.
pub(crate) fn leading_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.children().next()?.value().as_text()?;
    let text = collapse_whitespace(text);
    (!text.is_empty()).then_some(text)
}
