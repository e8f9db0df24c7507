//! Source definition loading from TOML.
//!
//! Definitions ship built into the binary and can be replaced by a
//! directory of TOML files (`[sources] definitions_dir`).

use crate::{
    definition::SourceDefinition,
    error::{Result, SourceError},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const BUILTIN_DEFINITIONS: [(&str, &str); 3] = [
    ("atlanta.toml", include_str!("../definitions/atlanta.toml")),
    ("chicago.toml", include_str!("../definitions/chicago.toml")),
    ("st-louis.toml", include_str!("../definitions/st-louis.toml")),
];

/// Loader for source definitions.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    /// Directory of definition files, `None` for the built-in set
    definitions_dir: Option<PathBuf>,
}

impl SourceLoader {
    /// Create a loader reading definitions from a directory.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn new(definitions_dir: impl Into<PathBuf>) -> Result<Self> {
        let definitions_dir = definitions_dir.into();

        if !definitions_dir.is_dir() {
            return Err(SourceError::DirectoryNotFound {
                path: definitions_dir.display().to_string(),
            });
        }

        Ok(Self {
            definitions_dir: Some(definitions_dir),
        })
    }

    /// Create a loader over the definitions compiled into the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            definitions_dir: None,
        }
    }

    /// Load every definition.
    ///
    /// Invalid definition files are logged as warnings and skipped. A broken
    /// built-in definition is an error.
    ///
    /// # Errors
    /// Returns error if the directory can't be read.
    pub fn load_all(&self) -> Result<Vec<SourceDefinition>> {
        let mut definitions = Vec::new();

        match &self.definitions_dir {
            Some(dir) => {
                Self::walk_and_load_recursive(dir, &mut definitions)?;
                info!(
                    count = definitions.len(),
                    dir = %dir.display(),
                    "loaded source definitions"
                );
            }
            None => {
                for (name, contents) in BUILTIN_DEFINITIONS {
                    let definition = Self::parse(name, contents)?;
                    definition.validate()?;
                    definitions.push(definition);
                }
                debug!(count = definitions.len(), "loaded built-in source definitions");
            }
        }

        Ok(definitions)
    }

    /// Recursively walk directory and load all TOML files.
    fn walk_and_load_recursive(dir: &Path, definitions: &mut Vec<SourceDefinition>) -> Result<()> {
        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for path in entries {
            if path.is_dir() {
                Self::walk_and_load_recursive(&path, definitions)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("toml") {
                match Self::load_from_path(&path) {
                    Ok(definition) => {
                        if let Err(e) = definition.validate() {
                            warn!(
                                path = %path.display(),
                                error = %e,
                                "skipping invalid source definition"
                            );
                            continue;
                        }
                        definitions.push(definition);
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to load source definition"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Load a source definition from a specific file path.
    fn load_from_path(path: &Path) -> Result<SourceDefinition> {
        let contents = std::fs::read_to_string(path).map_err(|e| SourceError::LoadError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::parse(&path.display().to_string(), &contents)
    }

    fn parse(path: &str, contents: &str) -> Result<SourceDefinition> {
        toml::from_str(contents).map_err(|e| SourceError::ParseError {
            path: path.to_string(),
            source: e,
        })
    }
}
