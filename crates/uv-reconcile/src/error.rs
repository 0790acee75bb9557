//! Reconciliation errors

use crate::keyed::Category;
use std::fmt::{self, Display, Formatter};

/// Which side of the comparison an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Declared in the task config
    Expected,
    /// Reported by the simulator
    Actual,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Expected => "expected",
            Self::Actual => "actual",
        })
    }
}

/// Errors that prevent a verdict from being computed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Two entries on one side share a key
    #[error("duplicate key {key} in {side} {category}")]
    DuplicateKey {
        side: Side,
        category: Category,
        key: String,
    },
}

impl ReconcileError {
    /// Create duplicate key error
    pub fn duplicate_key(side: Side, category: Category, key: impl Display) -> Self {
        Self::DuplicateKey {
            side,
            category,
            key: key.to_string(),
        }
    }
}
