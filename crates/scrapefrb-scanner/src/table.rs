//! Raw scraped rows before normalization.

use std::collections::HashMap;

/// Name of the synthetic column holding a row's absolute document URL.
pub const URL_COLUMN: &str = "URL";

/// Loosely typed rows as published by a source.
///
/// Headers keep their discovery order; each row maps header text to the
/// cell value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedTable {
    headers: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

impl ScrapedTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header unless it is already present.
    pub fn ensure_header(&mut self, header: &str) {
        if !self.headers.iter().any(|h| h == header) {
            self.headers.push(header.to_string());
        }
    }

    /// Append a row; unknown keys become headers.
    pub fn push_row(&mut self, row: HashMap<String, String>, key_order: &[String]) {
        for key in key_order {
            if row.contains_key(key) {
                self.ensure_header(key);
            }
        }
        let mut extra: Vec<&String> = row
            .keys()
            .filter(|k| !self.headers.contains(k))
            .collect();
        extra.sort();
        let extra: Vec<String> = extra.into_iter().cloned().collect();
        for key in &extra {
            self.ensure_header(key);
        }
        self.rows.push(row);
    }

    /// Header texts in discovery order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows in discovery order.
    #[must_use]
    pub fn rows(&self) -> &[HashMap<String, String>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
