//! Paged HTML table driven by form postbacks.

use super::pager::{PageRequest, PaginationState, PaginationStateMachine};
use super::{child_elements, element_text, parse_selector};
use crate::error::Result;
use crate::fetch::HttpFetcher;
use crate::table::{ScrapedTable, URL_COLUMN};
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Compiled selectors for one postback source.
#[derive(Debug, Clone)]
struct PageSelectors {
    hidden: Selector,
    header: Selector,
    row: Selector,
    cell: Selector,
    preview: Selector,
    pager: Selector,
}

/// Everything extracted from one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ParsedPage {
    pub(crate) pagination: PaginationState,
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
    pub(crate) urls: Vec<String>,
}

/// Scraper for postback-paged listings.
#[derive(Debug, Clone)]
pub struct PostbackScraper {
    name: String,
    base_url: Url,
    hidden_field_marker: String,
    current_page_class: String,
    listing_marker: String,
    event_target_field: String,
    event_argument_field: String,
    host_header: Option<String>,
    max_rounds: u32,
    selectors: PageSelectors,
}

/// Configuration for [`PostbackScraper::new`].
#[derive(Debug, Clone)]
pub(crate) struct PostbackConfig<'a> {
    pub(crate) name: &'a str,
    pub(crate) base_url: Url,
    pub(crate) hidden_field_marker: &'a str,
    pub(crate) header_selector: &'a str,
    pub(crate) row_selector: &'a str,
    pub(crate) preview_selector: &'a str,
    pub(crate) pager_selector: &'a str,
    pub(crate) current_page_class: &'a str,
    pub(crate) listing_marker: &'a str,
    pub(crate) event_target_field: &'a str,
    pub(crate) event_argument_field: &'a str,
    pub(crate) host_header: Option<&'a str>,
    pub(crate) max_rounds: u32,
}

impl PostbackScraper {
    pub(crate) fn new(config: PostbackConfig<'_>) -> Result<Self> {
        let selectors = PageSelectors {
            hidden: parse_selector("input[type=\"hidden\"]")?,
            header: parse_selector(config.header_selector)?,
            row: parse_selector(config.row_selector)?,
            cell: parse_selector("td")?,
            preview: parse_selector(config.preview_selector)?,
            pager: parse_selector(config.pager_selector)?,
        };

        Ok(Self {
            name: config.name.to_string(),
            base_url: config.base_url,
            hidden_field_marker: config.hidden_field_marker.to_string(),
            current_page_class: config.current_page_class.to_string(),
            listing_marker: config.listing_marker.to_string(),
            event_target_field: config.event_target_field.to_string(),
            event_argument_field: config.event_argument_field.to_string(),
            host_header: config.host_header.map(str::to_string),
            max_rounds: config.max_rounds,
            selectors,
        })
    }

    /// Round cap in effect.
    #[must_use]
    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub(crate) async fn scrape(&self, fetcher: &HttpFetcher) -> ScrapedTable {
        let mut table = ScrapedTable::new();
        let mut headers: Option<Vec<String>> = None;
        let mut pager = PaginationStateMachine::new(
            self.max_rounds,
            &self.event_target_field,
            &self.event_argument_field,
        );

        tracing::info!("Beginning scrape of {}", self.name);

        while let Some(request) = pager.next_request() {
            let form = match &request {
                PageRequest::Initial => None,
                PageRequest::Postback(form) => Some(form.as_slice()),
            };

            let body = match fetcher
                .post_form(self.base_url.as_str(), form, self.host_header.as_deref())
                .await
            {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        source = %self.name,
                        page = pager.rounds(),
                        error = %e,
                        "page fetch failed, keeping rows collected so far"
                    );
                    pager.finish();
                    break;
                }
            };

            let page = self.parse_page(&body);
            let columns = headers.get_or_insert_with(|| {
                let mut h = page.headers.clone();
                h.push(URL_COLUMN.to_string());
                h
            });

            for (cells, url) in page.rows.into_iter().zip(page.urls) {
                let mut row: HashMap<String, String> = columns
                    .iter()
                    .filter(|h| *h != URL_COLUMN)
                    .cloned()
                    .zip(cells)
                    .collect();
                row.insert(URL_COLUMN.to_string(), url);
                table.push_row(row, columns.as_slice());
            }

            tracing::debug!(page = pager.rounds(), rows = table.len(), "parsed listing page");
            pager.advance(page.pagination);
        }

        if pager.hit_cap() {
            tracing::warn!(
                source = %self.name,
                max_rounds = self.max_rounds,
                "stopped paging at the round cap"
            );
        }

        tracing::info!("Scraped {} rows from {}", table.len(), self.name);
        table
    }

    pub(crate) fn parse_page(&self, html: &str) -> ParsedPage {
        let document = Html::parse_document(html);
        let mut page = ParsedPage::default();

        page.pagination.fields = document
            .select(&self.selectors.hidden)
            .filter_map(|input| {
                let name = input.value().attr("name")?;
                name.contains(&self.hidden_field_marker).then(|| {
                    (
                        name.to_string(),
                        input.value().attr("value").unwrap_or_default().to_string(),
                    )
                })
            })
            .collect();

        page.headers = document
            .select(&self.selectors.header)
            .map(element_text)
            .collect();

        for tr in document.select(&self.selectors.row) {
            let cells: Vec<String> = tr.select(&self.selectors.cell).map(element_text).collect();
            if cells.is_empty() {
                continue;
            }

            let Some(href) = tr
                .select(&self.selectors.preview)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };

            match self.base_url.join(href) {
                Ok(url) => {
                    page.rows.push(cells);
                    page.urls.push(url.to_string());
                }
                Err(e) => tracing::warn!(href, error = %e, "unresolvable preview link"),
            }
        }

        page.pagination.next_target = self.next_target(&document);
        page
    }

    fn next_target(&self, document: &Html) -> Option<String> {
        let pager = document.select(&self.selectors.pager).next()?;
        let mut passed_current = false;

        for span in child_elements(pager).filter(|e| e.value().name() == "span") {
            for child in child_elements(span) {
                let element = child.value();
                if element.name() == "span"
                    && element.classes().any(|class| class == self.current_page_class)
                {
                    passed_current = true;
                } else if passed_current && element.name() == "a" {
                    let target = element.attr("href").and_then(|href| {
                        href.split('\'')
                            .find(|piece| piece.contains(&self.listing_marker))
                            .map(str::to_string)
                    });
                    if target.is_some() {
                        return target;
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_ONE: &str = r#"
<html><body>
<form>
  <input type="hidden" name="__VIEWSTATE" value="state1" />
  <input type="hidden" name="__EVENTVALIDATION" />
  <input type="hidden" name="session" value="ignored" />
</form>
<table>
  <tr><th>RSSD</th><th>Institution</th><th>Date</th><th>Year</th></tr>
  <tr>
    <td>1234567</td><td>Acme   Bancorp</td><td>03/28/2013</td><td>2012</td>
    <td><a class="previewLink" href="GetDocument.aspx?id=42">View</a></td>
  </tr>
  <tr><td>no link</td></tr>
</table>
<div id="searchResultsPager">
  <span>
    <span class="currentSearchPage">1</span>
    <a href="javascript:__doPostBack('ctl00$SearchData$pager$2','')">2</a>
  </span>
</div>
</body></html>
"#;

    const LAST_PAGE: &str = r#"
<html><body>
<input type="hidden" name="__VIEWSTATE" value="state2" />
<div id="searchResultsPager">
  <span>
    <a href="javascript:__doPostBack('ctl00$SearchData$pager$1','')">1</a>
    <span class="currentSearchPage">2</span>
  </span>
</div>
</body></html>
"#;

    fn scraper() -> PostbackScraper {
        PostbackScraper::new(PostbackConfig {
            base_url: Url::parse("https://pager.test/bsr/y6/").expect("valid url"),
            ..scraper_config()
        })
        .expect("valid selectors")
    }

    #[test]
    fn test_parse_first_page() {
        let page = scraper().parse_page(PAGE_ONE);

        assert_eq!(
            page.pagination.fields,
            vec![
                ("__VIEWSTATE".to_string(), "state1".to_string()),
                ("__EVENTVALIDATION".to_string(), String::new()),
            ]
        );
        assert_eq!(page.headers, vec!["RSSD", "Institution", "Date", "Year"]);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0][1], "Acme Bancorp");
        assert_eq!(page.urls, vec!["https://pager.test/bsr/y6/GetDocument.aspx?id=42"]);
        assert_eq!(
            page.pagination.next_target.as_deref(),
            Some("ctl00$SearchData$pager$2")
        );
    }

    #[test]
    fn test_last_page_has_no_target() {
        let page = scraper().parse_page(LAST_PAGE);
        assert!(page.pagination.next_target.is_none());
        assert!(page.rows.is_empty());
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let result = PostbackScraper::new(PostbackConfig {
            preview_selector: "a[",
            ..scraper_config()
        });
        assert!(result.is_err());
    }

    fn scraper_config() -> PostbackConfig<'static> {
        PostbackConfig {
            name: "Test Pager",
            base_url: Url::parse("https://pager.test/").expect("valid url"),
            hidden_field_marker: "__",
            header_selector: "table th",
            row_selector: "table tr",
            preview_selector: "a.previewLink",
            pager_selector: "#searchResultsPager",
            current_page_class: "currentSearchPage",
            listing_marker: "SearchData",
            event_target_field: "__EVENTTARGET",
            event_argument_field: "__EVENTARGUMENT",
            host_header: None,
            max_rounds: 1,
        }
    }
}
