//! Shared types used across the scrapefrb workspace.
//!
//! This module defines the canonical [`Document`] produced by every source,
//! the closed set of [`SourceCode`]s, and the identity key used to decide
//! whether a document has been seen before.

use crate::error::ScrapeFrbError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Short identifier of the site a document was scraped from.
///
/// Serialized as the single-letter code stored in the `source_code` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceCode {
    /// Federal Reserve Bank of Atlanta (paged JSON reader)
    #[serde(rename = "A")]
    Atlanta,
    /// Federal Reserve Bank of Chicago (static HTML table per year)
    #[serde(rename = "C")]
    Chicago,
    /// Federal Reserve Bank of St. Louis (postback pager)
    #[serde(rename = "S")]
    StLouis,
}

impl SourceCode {
    /// Every known source, in the order sources are processed.
    pub const ALL: [SourceCode; 3] = [Self::Atlanta, Self::Chicago, Self::StLouis];

    /// The single-letter code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atlanta => "A",
            Self::Chicago => "C",
            Self::StLouis => "S",
        }
    }

    /// Human-readable name of the originating bank.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Atlanta => "Federal Reserve Bank of Atlanta",
            Self::Chicago => "Federal Reserve Bank of Chicago",
            Self::StLouis => "Federal Reserve Bank of St. Louis",
        }
    }
}

impl fmt::Display for SourceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceCode {
    type Err = ScrapeFrbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "atlanta" => Ok(Self::Atlanta),
            "c" | "chicago" => Ok(Self::Chicago),
            "s" | "st-louis" | "stlouis" | "st. louis" => Ok(Self::StLouis),
            other => Err(ScrapeFrbError::Validation(format!(
                "unknown source code '{other}'"
            ))),
        }
    }
}

/// A filing document in canonical form.
///
/// Field renames match the run-log CSV header (`RSSD,Name,Date,Year,URL,Source`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// RSSD identifier of the filing institution
    #[serde(rename = "RSSD")]
    pub rssd_id: i64,
    /// Company name as published by the source
    #[serde(rename = "Name")]
    pub company: String,
    /// Date the filing was posted
    #[serde(rename = "Date")]
    pub filing_date: NaiveDateTime,
    /// Report year the filing covers
    #[serde(rename = "Year")]
    pub filing_year: i32,
    /// Absolute download URL
    #[serde(rename = "URL")]
    pub url: String,
    /// Originating site
    #[serde(rename = "Source")]
    pub source: SourceCode,
}

impl Document {
    /// The `(RSSD, company, year)` tuple that identifies this document in the store.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            rssd_id: self.rssd_id,
            company: self.company.clone(),
            filing_year: self.filing_year,
        }
    }
}

/// Identity of a filing: unique per row of the persisted store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    /// RSSD identifier
    pub rssd_id: i64,
    /// Company name
    pub company: String,
    /// Filing year
    pub filing_year: i32,
}

impl IdentityKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(rssd_id: i64, company: impl Into<String>, filing_year: i32) -> Self {
        Self {
            rssd_id,
            company: company.into(),
            filing_year,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.rssd_id, self.company, self.filing_year)
    }
}

/// Identity keys already present in the store when a run starts.
///
/// Loaded once per run and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedIdentitySet(HashSet<IdentityKey>);

impl PersistedIdentitySet {
    /// An empty set (first run).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the key is known.
    #[must_use]
    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.0.contains(key)
    }

    /// Number of known keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no keys are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<IdentityKey> for PersistedIdentitySet {
    fn from_iter<I: IntoIterator<Item = IdentityKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse an integer-like string such as `"1234"`, `" 1234 "` or `"1234.0"`.
///
/// JSON sources sometimes render integer columns as floats; anything with a
/// fractional part is rejected.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn parse_integer_like(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Parse a filing date with a chrono `strftime` format.
///
/// Formats without time fields parse to midnight.
pub fn parse_filing_date(raw: &str, format: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let trimmed = raw.trim();
    match NaiveDateTime::parse_from_str(trimmed, format) {
        Ok(datetime) => Ok(datetime),
        Err(datetime_err) => NaiveDate::parse_from_str(trimmed, format)
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|_| datetime_err),
    }
}

/// Trim and collapse internal runs of whitespace into single spaces.
#[must_use]
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
