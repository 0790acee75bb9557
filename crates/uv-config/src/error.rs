//! Error types for config resolution and loading
//!
//! Path errors never carry resolved absolute paths; they echo only the
//! caller-supplied relative request so a failed lookup cannot confirm what
//! exists outside the deployments root.

use std::path::PathBuf;

/// Errors during path resolution
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Identifier is empty or contains a separator or NUL byte
    #[error("invalid identifier '{segment}': {reason}")]
    InvalidIdentifier {
        segment: String,
        reason: &'static str,
    },

    /// Resolved path leaves the deployments root
    #[error("path '{requested}' escapes the deployments root")]
    PathTraversal { requested: String },

    /// Filesystem refused to resolve the path
    #[error("cannot resolve '{requested}': {source}")]
    Unresolvable {
        requested: String,
        #[source]
        source: std::io::Error,
    },

    /// Root directory missing or not a directory
    #[error("deployments root {path} is unavailable: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PathError {
    /// Create invalid identifier error
    pub fn invalid_identifier(segment: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidIdentifier {
            segment: segment.into(),
            reason,
        }
    }

    /// Create traversal error for a relative request
    pub fn traversal(requested: impl Into<String>) -> Self {
        Self::PathTraversal {
            requested: requested.into(),
        }
    }
}

/// Errors while loading a task configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Identifier or containment violation
    #[error(transparent)]
    Path(#[from] PathError),

    /// Task config file does not exist
    #[error("task config not found: {path}")]
    NotFound { path: PathBuf },

    /// File read failed for another reason
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parser reported failure or produced no config
    #[error("failed to parse {path}: {summary}")]
    Parse { path: PathBuf, summary: String },
}

impl ConfigError {
    /// Create parse error for a root-relative path
    pub fn parse_error(path: impl Into<PathBuf>, summary: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            summary: summary.into(),
        }
    }

    /// Create IO error for a root-relative path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_display_has_no_absolute_path() {
        let err = PathError::traversal("mainnet/../../etc");
        assert_eq!(
            err.to_string(),
            "path 'mainnet/../../etc' escapes the deployments root"
        );
    }

    #[test]
    fn parse_error_display() {
        let err = ConfigError::parse_error("mainnet/u1/validations/base.json", "line 1: bad");
        assert!(err.to_string().contains("mainnet/u1/validations/base.json"));
        assert!(err.to_string().contains("line 1: bad"));
    }

    #[test]
    fn path_error_converts() {
        let err: ConfigError =
            PathError::invalid_identifier("a/b", "contains a path separator").into();
        assert!(matches!(
            err,
            ConfigError::Path(PathError::InvalidIdentifier { .. })
        ));
    }
}
