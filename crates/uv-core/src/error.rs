//! Stage-tagged validation errors
//!
//! Each stage keeps its own error type; [`ValidationError`] wraps the first
//! failure unchanged and classifies it into an [`ErrorKind`].

use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use uv_config::{ConfigError, PathError};
use uv_reconcile::ReconcileError;
use uv_simulation::SimulationError;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Task config resolution and parsing
    Config,
    /// Simulator execution
    Simulation,
    /// Expected versus actual comparison
    Reconciliation,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Config => "config",
            Self::Simulation => "simulation",
            Self::Reconciliation => "reconciliation",
        })
    }
}

/// Failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Identifier is empty or contains a separator
    InvalidIdentifier,
    /// Path would leave the deployments root
    PathTraversal,
    /// Task config file is absent
    ConfigNotFound,
    /// Task config could not be parsed
    ConfigParseError,
    /// Filesystem failure
    IoError,
    /// Simulator exceeded its time budget
    SimulationTimeout,
    /// Simulator failed or produced an unusable report
    SimulationFailed,
    /// A key appears twice on one side
    DuplicateKey,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Terminal failure of a validation run
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Config stage failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Simulation stage failure
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Reconciliation stage failure
    #[error(transparent)]
    Reconciliation(#[from] ReconcileError),
}

impl ValidationError {
    /// Stage that failed
    #[inline]
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config(_) => Stage::Config,
            Self::Simulation(_) => Stage::Simulation,
            Self::Reconciliation(_) => Stage::Reconciliation,
        }
    }

    /// Classification of the failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(ConfigError::Path(path)) => match path {
                PathError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
                PathError::PathTraversal { .. } => ErrorKind::PathTraversal,
                PathError::Unresolvable { .. } | PathError::RootUnavailable { .. } => {
                    ErrorKind::IoError
                }
            },
            Self::Config(ConfigError::NotFound { .. }) => ErrorKind::ConfigNotFound,
            Self::Config(ConfigError::Io { .. }) => ErrorKind::IoError,
            Self::Config(ConfigError::Parse { .. }) => ErrorKind::ConfigParseError,
            Self::Simulation(SimulationError::Timeout { .. }) => ErrorKind::SimulationTimeout,
            Self::Simulation(SimulationError::Io(_)) => ErrorKind::IoError,
            Self::Simulation(_) => ErrorKind::SimulationFailed,
            Self::Reconciliation(ReconcileError::DuplicateKey { .. }) => ErrorKind::DuplicateKey,
        }
    }
}
