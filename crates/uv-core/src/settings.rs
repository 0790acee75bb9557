//! Validator settings
//!
//! Layered as defaults, then an optional TOML file, then environment
//! variables, then CLI flags (applied by the binary through `with_*`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uv_config::{PathError, DEFAULT_MAX_FILE_SIZE};
use uv_simulation::SimulationSettings;

/// Environment variable naming the deployments root
pub const DEPLOYMENTS_ROOT_ENV: &str = "CONTRACT_DEPLOYMENTS_ROOT";

/// Environment variable overriding the simulation timeout
pub const TIMEOUT_ENV: &str = "UPGRADE_VALIDATOR_TIMEOUT_SECS";

/// Settings errors; all are fatal at startup
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for this schema
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment variable has an unusable value
    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },

    /// No deployments root configured
    #[error("deployments root not configured (set CONTRACT_DEPLOYMENTS_ROOT or deployments_root)")]
    RootUnset,

    /// Configured root is missing or not a directory
    #[error("deployments root {path} is not a directory")]
    RootNotDirectory { path: PathBuf },

    /// Root could not be anchored
    #[error(transparent)]
    Root(#[from] PathError),
}

/// Task config loading settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSettings {
    /// Largest task config accepted, in bytes
    pub max_file_size: u64,
}

impl Default for ConfigSettings {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorSettings {
    /// Root of the deployments tree
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployments_root: Option<PathBuf>,
    /// Simulator invocation
    pub simulation: SimulationSettings,
    /// Task config loading
    pub config: ConfigSettings,
}

impl ValidatorSettings {
    /// Create default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML
    ///
    /// # Errors
    /// Returns error on invalid TOML, unknown value types, or values
    /// rejected by [`Self::validate`]
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make every run fail
    ///
    /// # Errors
    /// Returns `InvalidValue` for a zero timeout, output cap or file size
    /// cap, and for empty environment variable names
    pub fn validate(&self) -> Result<(), SettingsError> {
        let simulation = &self.simulation;
        if simulation.timeout_secs == 0 {
            return invalid("simulation.timeout_secs", simulation.timeout_secs);
        }
        if simulation.max_output_bytes == 0 {
            return invalid("simulation.max_output_bytes", simulation.max_output_bytes);
        }
        if simulation.rpc_url_env.is_empty() {
            return invalid("simulation.rpc_url_env", &simulation.rpc_url_env);
        }
        if simulation.report_path_env.is_empty() {
            return invalid("simulation.report_path_env", &simulation.report_path_env);
        }
        if self.config.max_file_size == 0 {
            return invalid("config.max_file_size", self.config.max_file_size);
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    ///
    /// # Errors
    /// Returns error if an override has an unusable value
    pub fn apply_env(self) -> Result<Self, SettingsError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup
    ///
    /// # Errors
    /// Returns error if an override has an unusable value
    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(DEPLOYMENTS_ROOT_ENV).filter(|v| !v.is_empty()) {
            self.deployments_root = Some(PathBuf::from(root));
        }

        if let Some(value) = lookup(TIMEOUT_ENV) {
            let secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(SettingsError::InvalidValue {
                    name: TIMEOUT_ENV,
                    value,
                })?;
            self.simulation.timeout_secs = secs;
        }

        Ok(self)
    }

    /// With deployments root
    #[inline]
    #[must_use]
    pub fn with_deployments_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.deployments_root = Some(root.into());
        self
    }

    /// With simulation timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.simulation = self.simulation.with_timeout(timeout);
        self
    }

    /// With simulation settings
    #[inline]
    #[must_use]
    pub fn with_simulation(mut self, simulation: SimulationSettings) -> Self {
        self.simulation = simulation;
        self
    }
}

fn invalid(name: &'static str, value: impl ToString) -> Result<(), SettingsError> {
    Err(SettingsError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

/// Locate and canonicalize the deployments root
///
/// The explicit setting wins, then `CONTRACT_DEPLOYMENTS_ROOT`.
///
/// # Errors
/// - `RootUnset` if neither is given
/// - `RootNotDirectory` if the path is missing or not a directory
pub fn find_contract_deployments_root(
    settings: &ValidatorSettings,
) -> Result<PathBuf, SettingsError> {
    let configured = settings
        .deployments_root
        .clone()
        .or_else(|| {
            std::env::var_os(DEPLOYMENTS_ROOT_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .ok_or(SettingsError::RootUnset)?;

    match configured.canonicalize() {
        Ok(root) if root.is_dir() => Ok(root),
        _ => Err(SettingsError::RootNotDirectory { path: configured }),
    }
}
