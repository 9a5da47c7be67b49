use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::rebuild::PkgMatcher;

/// Default config file name, looked up relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".go-delta.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("empty dependency pattern for {file:?} in {}", path.display())]
    EmptyPattern { path: PathBuf, file: String },
}

/// Configuration loaded from `.go-delta.toml`.
///
/// ```toml
/// [deps]
/// "db/schema.sql" = "./internal/store/..."
/// ```
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DeltaConfig {
    /// Explicit dependencies: changed file (relative to the repository root)
    /// -> package directory pattern that must be rebuilt when it changes.
    #[serde(default)]
    pub deps: BTreeMap<String, String>,
}

impl DeltaConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the default (empty) configuration; any other read
    /// error or a malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some((file, _)) = config.deps.iter().find(|(_, pattern)| pattern.is_empty()) {
            return Err(ConfigError::EmptyPattern {
                path: path.to_path_buf(),
                file: file.clone(),
            });
        }

        Ok(config)
    }

    /// Matchers for the explicit dependencies triggered by `changed_files`.
    pub fn explicit_matchers(&self, changed_files: &[String]) -> Vec<PkgMatcher> {
        changed_files
            .iter()
            .filter_map(|f| self.deps.get(f))
            .map(|pattern| PkgMatcher::parse(pattern))
            .collect()
    }
}
