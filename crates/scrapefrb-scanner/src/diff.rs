//! Set difference between scraped documents and the persisted identities.

use scrapefrb_core::{Document, PersistedIdentitySet};

/// Documents whose identity key is not in `persisted`, in input order.
#[must_use]
pub fn diff(persisted: &PersistedIdentitySet, documents: &[Document]) -> Vec<Document> {
    documents
        .iter()
        .filter(|document| !persisted.contains(&document.identity_key()))
        .cloned()
        .collect()
}
