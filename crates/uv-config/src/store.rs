//! Config Store - task config loading
//!
//! Resolves `<root>/<network>/<upgrade>/validations/<name>.json` through the
//! [`PathResolver`], reads it and hands the bytes to a [`TaskConfigParser`].
//! Each call is independent: same bytes, same result.

use crate::error::{ConfigError, ConfigResult};
use crate::parser::{JsonTaskConfigParser, TaskConfigParser};
use crate::path::{validate_identifier, PathResolver};
use sha2::{Digest, Sha256};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use uv_effects::TaskConfig;

/// Directory under an upgrade that holds its task configs
pub const VALIDATIONS_DIR: &str = "validations";

/// Default maximum task config size (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Where a loaded config came from
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSource {
    /// Path relative to the deployments root
    pub relative_path: PathBuf,
    /// SHA-256 of the file bytes, hex encoded
    pub sha256: String,
    /// File size in bytes
    pub size: u64,
}

/// Task config together with its source metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTaskConfig {
    /// The parsed config
    pub config: TaskConfig,
    /// Source metadata
    pub source: ConfigSource,
}

/// Loads task configs from the deployments tree
#[derive(Debug, Clone)]
pub struct ConfigStore {
    resolver: PathResolver,
    parser: Arc<dyn TaskConfigParser>,
    max_file_size: u64,
}

impl ConfigStore {
    /// Create a store with the JSON parser
    #[must_use]
    pub fn new(resolver: PathResolver) -> Self {
        Self::with_parser(resolver, Arc::new(JsonTaskConfigParser::new()))
    }

    /// Create a store with a custom parser
    #[must_use]
    pub fn with_parser(resolver: PathResolver, parser: Arc<dyn TaskConfigParser>) -> Self {
        Self {
            resolver,
            parser,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set maximum accepted file size
    #[inline]
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Resolver anchored at the deployments root
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Directory of an upgrade (the simulation working directory)
    ///
    /// # Errors
    /// - `Path` for invalid identifiers or containment violations
    /// - `NotFound` if the directory does not exist
    pub fn upgrade_dir(&self, network: &str, upgrade_id: &str) -> ConfigResult<PathBuf> {
        let dir = self.resolver.resolve(&[network, upgrade_id])?;
        if !dir.is_dir() {
            return Err(ConfigError::NotFound {
                path: self.resolver.relative(&dir).to_path_buf(),
            });
        }
        Ok(dir)
    }

    /// Load and parse a task config
    ///
    /// # Errors
    /// - `Path(InvalidIdentifier)` if any identifier is malformed
    /// - `Path(PathTraversal)` if the file would resolve outside the root
    /// - `NotFound` if the file does not exist
    /// - `Io` for other read failures
    /// - `Parse` if the file is too large, not UTF-8, or the parser fails
    pub async fn load(
        &self,
        network: &str,
        upgrade_id: &str,
        config_name: &str,
    ) -> ConfigResult<LoadedTaskConfig> {
        validate_identifier(config_name)?;

        let file_name = format!("{config_name}.{}", self.parser.extension());
        let path = self
            .resolver
            .resolve(&[network, upgrade_id, VALIDATIONS_DIR, file_name.as_str()])?;
        let relative = self.resolver.relative(&path).to_path_buf();

        let metadata = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound {
                path: relative.clone(),
            },
            _ => ConfigError::io_error(relative.clone(), e),
        })?;

        if !metadata.is_file() {
            return Err(ConfigError::io_error(
                relative,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        if metadata.len() > self.max_file_size {
            return Err(ConfigError::parse_error(
                relative,
                format!(
                    "file too large: {} bytes (max: {})",
                    metadata.len(),
                    self.max_file_size
                ),
            ));
        }

        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound {
                path: relative.clone(),
            },
            _ => ConfigError::io_error(relative.clone(), e),
        })?;

        let sha256 = hex::encode(Sha256::digest(&bytes));
        let size = bytes.len() as u64;

        let content = String::from_utf8(bytes)
            .map_err(|_| ConfigError::parse_error(relative.clone(), "file is not valid UTF-8"))?;

        let outcome = self.parser.parse(&content);
        for warning in outcome.warnings() {
            tracing::warn!(path = %relative.display(), "{warning}");
        }

        let config = match outcome.config {
            Some(config) if outcome.success => config,
            _ => return Err(ConfigError::parse_error(relative, outcome.summary())),
        };

        tracing::info!(
            path = %relative.display(),
            sha256 = %sha256,
            state_changes = config.state_changes.len(),
            balance_changes = config.balance_changes.len(),
            "loaded task config"
        );

        Ok(LoadedTaskConfig {
            config,
            source: ConfigSource {
                relative_path: relative,
                sha256,
                size,
            },
        })
    }
}
