//! In-memory source definition registry.

use crate::{
    definition::SourceDefinition,
    error::{Result, SourceError},
    loader::SourceLoader,
};
use scrapefrb_core::SourceCode;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// In-memory cache of source definitions keyed by source code.
///
/// Iteration always follows [`SourceCode::ALL`] order so runs are
/// deterministic regardless of load order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    /// Cached definitions, indexed by source code
    definitions: Arc<RwLock<HashMap<SourceCode, SourceDefinition>>>,
}

impl SourceRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry and load all definitions from the given loader.
    pub fn load_from(loader: &SourceLoader) -> Result<Self> {
        let registry = Self::new();
        registry.reload(loader)?;
        Ok(registry)
    }

    /// Create a registry holding the built-in definitions.
    pub fn builtin() -> Result<Self> {
        Self::load_from(&SourceLoader::builtin())
    }

    /// Replace the cache with freshly loaded definitions.
    pub fn reload(&self, loader: &SourceLoader) -> Result<()> {
        let definitions = loader.load_all()?;

        let mut cache = self
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        cache.clear();

        for definition in definitions {
            if let Some(previous) = cache.insert(definition.code(), definition) {
                debug!(
                    source = %previous.code(),
                    "later definition replaces an earlier one"
                );
            }
        }

        info!(count = cache.len(), "reloaded source definitions");
        Ok(())
    }

    /// Get a definition by source code.
    pub fn get(&self, code: SourceCode) -> Result<SourceDefinition> {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&code)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                source_code: code.to_string(),
            })
    }

    /// Definitions for the given codes, in source order.
    ///
    /// Codes without a definition are skipped.
    #[must_use]
    pub fn select(&self, codes: &[SourceCode]) -> Vec<SourceDefinition> {
        let cache = self
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        SourceCode::ALL
            .iter()
            .filter(|code| codes.contains(code))
            .filter_map(|code| cache.get(code).cloned())
            .collect()
    }

    /// Number of cached definitions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
