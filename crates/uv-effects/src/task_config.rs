//! Task configuration
//!
//! The declarative file an upgrade author writes: how to simulate the
//! upgrade and what it is expected to do.

use crate::effect::{
    deserialize_changes, deserialize_overrides, BalanceChange, DomainAndMessageHashes, Effect,
    StateChange, StateOverride,
};
use serde::{Deserialize, Serialize};

/// Parsed task configuration
///
/// Immutable once loaded; scoped to a single validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConfig {
    /// Simulator command template, split on whitespace before execution
    pub cmd: String,
    /// RPC endpoint of the forked chain
    pub rpc_url: String,
    /// Preconditions written before execution
    #[serde(deserialize_with = "deserialize_overrides")]
    pub state_overrides: Vec<StateOverride>,
    /// Expected storage mutations
    #[serde(deserialize_with = "deserialize_changes")]
    pub state_changes: Vec<StateChange>,
    /// Expected balance movements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub balance_changes: Vec<BalanceChange>,
    /// Expected signing hashes, if asserted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_domain_and_message_hashes: Option<DomainAndMessageHashes>,
}

impl TaskConfig {
    /// Expected side of the reconciliation
    #[must_use]
    pub fn expected_effect(&self) -> Effect {
        Effect {
            state_overrides: self.state_overrides.clone(),
            state_changes: self.state_changes.clone(),
            balance_changes: self.balance_changes.clone(),
            domain_and_message_hashes: self.expected_domain_and_message_hashes.clone(),
        }
    }

    /// Command template split into argv tokens
    #[must_use]
    pub fn command_tokens(&self) -> Vec<String> {
        self.cmd.split_whitespace().map(str::to_string).collect()
    }
}
