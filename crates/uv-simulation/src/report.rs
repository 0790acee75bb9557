//! Simulator report parsing
//!
//! The report is untrusted. It is parsed into the same typed entries a task
//! config uses and validated before anything reaches reconciliation.

use serde::Deserialize;
use uv_effects::{
    deserialize_changes, deserialize_overrides, BalanceChange, DomainAndMessageHashes, Effect,
    StateChange, StateOverride,
};

/// File name of the report inside the per-run directory
pub const REPORT_FILE_NAME: &str = "report.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    #[serde(deserialize_with = "deserialize_overrides")]
    state_overrides: Vec<StateOverride>,
    #[serde(deserialize_with = "deserialize_changes")]
    state_changes: Vec<StateChange>,
    #[serde(default)]
    balance_changes: Vec<BalanceChange>,
    #[serde(default, alias = "expectedDomainAndMessageHashes")]
    domain_and_message_hashes: Option<DomainAndMessageHashes>,
}

/// Why a report was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    /// Nothing to parse
    #[error("simulator produced an empty report")]
    Empty,

    /// Not valid JSON or wrong shape
    #[error("malformed report at {line}:{column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },

    /// Hash section absent
    #[error("report is missing domainAndMessageHashes")]
    MissingHashes,

    /// Entry parsed but is not comparable
    #[error("balanceChanges[{index}]: {message}")]
    InvalidEntry { index: usize, message: String },
}

/// Parse and validate a simulator report
///
/// # Errors
/// Returns a [`ReportError`] describing the first schema violation
pub fn parse_report(text: &str) -> Result<Effect, ReportError> {
    if text.trim().is_empty() {
        return Err(ReportError::Empty);
    }

    let raw: RawReport = serde_json::from_str(text).map_err(|e| ReportError::Malformed {
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })?;

    let hashes = raw
        .domain_and_message_hashes
        .ok_or(ReportError::MissingHashes)?;

    for (index, balance) in raw.balance_changes.iter().enumerate() {
        balance.validate().map_err(|e| ReportError::InvalidEntry {
            index,
            message: e.to_string(),
        })?;
    }

    Ok(Effect {
        state_overrides: raw.state_overrides,
        state_changes: raw.state_changes,
        balance_changes: raw.balance_changes,
        domain_and_message_hashes: Some(hashes),
    })
}
