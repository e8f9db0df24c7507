//! JSON reader queried once for its year list, then once per year.

use crate::fetch::HttpFetcher;
use crate::table::{ScrapedTable, URL_COLUMN};
use serde_json::Value;
use std::collections::HashMap;

/// Scraper for sources exposing a `{COLUMNS: [...], DATA: [[...]]}` reader.
#[derive(Debug, Clone)]
pub struct PagedJsonScraper {
    pub(crate) name: String,
    pub(crate) year_list_url: String,
    pub(crate) docs_url_template: String,
    pub(crate) doc_prefix: String,
    pub(crate) filename_column: String,
    pub(crate) columns_key: String,
    pub(crate) rows_key: String,
}

impl PagedJsonScraper {
    pub(crate) async fn scrape(&self, fetcher: &HttpFetcher) -> ScrapedTable {
        let mut table = ScrapedTable::new();
        tracing::info!("Beginning scrape of {}", self.name);

        let years = match fetcher.get_json(&self.year_list_url).await {
            Ok(json) => parse_years(&json),
            Err(e) => {
                tracing::warn!(source = %self.name, error = %e, "year list unavailable");
                return table;
            }
        };

        let Some(years) = years else {
            tracing::warn!(source = %self.name, "year list is not a JSON array");
            return table;
        };

        for year in years {
            let url = self.docs_url_template.replace("{year}", &year);
            tracing::info!("Please wait. Loading {}", url);

            match fetcher.get_json(&url).await {
                Ok(json) => {
                    let before = table.len();
                    self.parse_listing(&json, &mut table);
                    tracing::info!("Found {} files covering {}", table.len() - before, year);
                }
                Err(e) => {
                    tracing::warn!(year = %year, error = %e, "no documents loaded for year");
                }
            }
        }

        tracing::info!("Scraped {} rows from {}", table.len(), self.name);
        table
    }

    fn parse_listing(&self, json: &Value, table: &mut ScrapedTable) {
        let Some(columns) = json.get(&self.columns_key).and_then(Value::as_array) else {
            tracing::warn!(key = %self.columns_key, "listing has no column array");
            return;
        };
        let Some(rows) = json.get(&self.rows_key).and_then(Value::as_array) else {
            tracing::warn!(key = %self.rows_key, "listing has no row array");
            return;
        };

        let mut key_order: Vec<String> = columns.iter().map(render_value).collect();
        key_order.push(URL_COLUMN.to_string());

        for row in rows {
            let Some(cells) = row.as_array() else {
                tracing::warn!("skipping listing row that is not an array");
                continue;
            };

            let mut record: HashMap<String, String> = key_order
                .iter()
                .zip(cells.iter().map(render_value))
                .map(|(column, value)| (column.clone(), value))
                .collect();

            match record.get(&self.filename_column).map(|f| f.trim().to_string()) {
                Some(filename) if !filename.is_empty() => {
                    record.insert(
                        URL_COLUMN.to_string(),
                        format!("{}{}", self.doc_prefix, filename),
                    );
                    table.push_row(record, &key_order);
                }
                _ => {
                    tracing::warn!(
                        column = %self.filename_column,
                        "skipping listing row without a file name"
                    );
                }
            }
        }
    }
}

/// Years as strings; `None` when the body is not an array.
fn parse_years(json: &Value) -> Option<Vec<String>> {
    json.as_array().map(|years| {
        years
            .iter()
            .map(render_value)
            .filter(|year| !year.trim().is_empty())
            .collect()
    })
}

/// Render a JSON cell the way it reads on the page.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.as_i64().map_or_else(|| n.to_string(), |i| i.to_string()),
        other => other.to_string(),
    }
}
