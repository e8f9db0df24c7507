#![allow(clippy::must_use_candidate)]

use scrapefrb_core::SourceCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFilter {
    All,
    Specific(Vec<SourceCode>),
}

impl SourceFilter {
    /// `All` when no source was named explicitly.
    pub fn from_flags(codes: Vec<SourceCode>) -> Self {
        if codes.is_empty() {
            SourceFilter::All
        } else {
            SourceFilter::Specific(codes)
        }
    }

    /// Codes to run, in processing order, restricted to `enabled`.
    pub fn select(&self, enabled: &[SourceCode]) -> Vec<SourceCode> {
        SourceCode::ALL
            .into_iter()
            .filter(|code| match self {
                SourceFilter::All => enabled.contains(code),
                SourceFilter::Specific(codes) => codes.contains(code),
            })
            .collect()
    }
}
