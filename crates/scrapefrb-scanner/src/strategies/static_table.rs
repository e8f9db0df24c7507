//! Static HTML listing with one page per report year.
//!
//! The base page names the year it displays and links every other year.
//! Listing rows are recognised structurally: a `<tr>` whose first cell starts
//! with a `<label for="...">` naming one of the configured cell roles.

use super::{child_elements, element_text, leading_text, parse_selector};
use crate::error::Result;
use crate::fetch::HttpFetcher;
use crate::table::{ScrapedTable, URL_COLUMN};
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Scraper for per-year static tables.
#[derive(Debug, Clone)]
pub struct StaticTableScraper {
    pub(crate) name: String,
    pub(crate) base_url: Url,
    pub(crate) current_year_marker: String,
    pub(crate) year_selector_marker: String,
    pub(crate) cell_roles: Vec<String>,
    pub(crate) year_column: String,
    pub(crate) current_year_param: String,
    pub(crate) display_year_param: String,
    pub(crate) fixed_params: BTreeMap<String, String>,
}

/// Year markers found on the base page.
#[derive(Debug, Clone, PartialEq, Eq)]
struct YearIndex {
    current: String,
    selectable: Vec<String>,
}

impl StaticTableScraper {
    pub(crate) async fn scrape(&self, fetcher: &HttpFetcher) -> Result<ScrapedTable> {
        let mut table = ScrapedTable::new();
        tracing::info!("Beginning scrape of {}", self.name);

        let html = match fetcher.get_text(self.base_url.as_str(), &[]).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(source = %self.name, error = %e, "base page unavailable");
                return Ok(table);
            }
        };

        let b_selector = parse_selector("b")?;
        let td_selector = parse_selector("td")?;
        let tr_selector = parse_selector("tr")?;

        let Some(index) = self.parse_year_index(&html, &b_selector, &td_selector) else {
            tracing::warn!(
                source = %self.name,
                "year markers missing from base page, markup may have changed"
            );
            return Ok(table);
        };

        self.collect_page(&html, &index.current, &tr_selector, &mut table);

        for year in index.selectable.iter().filter(|y| **y != index.current) {
            let query = self.year_query(&index.current, year);
            match fetcher.get_text(self.base_url.as_str(), &query).await {
                Ok(html) => self.collect_page(&html, year, &tr_selector, &mut table),
                Err(e) => {
                    tracing::warn!(year = %year, error = %e, "no documents loaded for year");
                }
            }
        }

        tracing::info!("Scraped {} rows from {}", table.len(), self.name);
        Ok(table)
    }

    fn year_query(&self, current: &str, year: &str) -> Vec<(String, String)> {
        self.fixed_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .chain([
                (self.current_year_param.clone(), current.to_string()),
                (self.display_year_param.clone(), year.to_string()),
            ])
            .collect()
    }

    fn parse_year_index(
        &self,
        html: &str,
        b_selector: &Selector,
        td_selector: &Selector,
    ) -> Option<YearIndex> {
        let document = Html::parse_document(html);

        let current = document
            .select(b_selector)
            .map(element_text)
            .find(|text| text.contains(&self.current_year_marker))
            .map(|text| {
                let chars: Vec<char> = text.chars().collect();
                chars[chars.len().saturating_sub(4)..].iter().collect::<String>()
            })?;

        let selectable = document
            .select(td_selector)
            .find(|td| {
                leading_text(*td).is_some_and(|text| text.contains(&self.year_selector_marker))
            })
            .map(|td| {
                child_elements(td)
                    .map(element_text)
                    .filter(|year| !year.is_empty())
                    .collect::<Vec<_>>()
            })?;

        Some(YearIndex {
            current,
            selectable,
        })
    }

    fn collect_page(&self, html: &str, year: &str, tr_selector: &Selector, table: &mut ScrapedTable) {
        let rows = self.extract_rows(html, year, tr_selector);

        if rows.is_empty() {
            tracing::warn!("No files parsed for {} from {}", year, self.base_url);
            return;
        }

        tracing::info!("Found {} files covering {}", rows.len(), year);

        let mut key_order = self.cell_roles.clone();
        key_order.push(URL_COLUMN.to_string());
        key_order.push(self.year_column.clone());

        for row in rows {
            table.push_row(row, &key_order);
        }
    }

    fn extract_rows(&self, html: &str, year: &str, tr_selector: &Selector) -> Vec<HashMap<String, String>> {
        let document = Html::parse_document(html);
        let mut rows = Vec::new();

        for tr in document.select(tr_selector) {
            if !self.is_listing_row(tr) {
                continue;
            }

            let mut row = HashMap::new();
            for td in child_elements(tr) {
                let Some(label) = child_elements(td).next().filter(|e| e.value().name() == "label")
                else {
                    continue;
                };
                let Some(role) = label.value().attr("for") else {
                    continue;
                };

                if let Some(text) = leading_text(label) {
                    row.insert(role.to_string(), text);
                } else if let Some(anchor) = child_elements(label).find(|e| e.value().name() == "a") {
                    if let Some(href) = anchor.value().attr("href") {
                        match self.base_url.join(href) {
                            Ok(url) => {
                                row.insert(URL_COLUMN.to_string(), url.to_string());
                            }
                            Err(e) => tracing::warn!(href, error = %e, "unresolvable document link"),
                        }
                    }
                    row.insert(role.to_string(), element_text(anchor));
                }
            }

            row.insert(self.year_column.clone(), year.to_string());
            rows.push(row);
        }

        rows
    }

    fn is_listing_row(&self, tr: ElementRef<'_>) -> bool {
        child_elements(tr)
            .next()
            .filter(|cell| cell.value().name() == "td")
            .and_then(|cell| child_elements(cell).next())
            .filter(|label| label.value().name() == "label")
            .and_then(|label| label.value().attr("for"))
            .is_some_and(|role| self.cell_roles.iter().any(|r| r == role))
    }
}
