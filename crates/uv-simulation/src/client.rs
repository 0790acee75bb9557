//! Simulation client trait

use crate::error::SimulationResult;
use async_trait::async_trait;
use std::path::PathBuf;
use uv_effects::Effect;

/// One simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    /// RPC endpoint of the forked chain
    pub rpc_url: String,
    /// Pre-tokenized argv
    pub command: Vec<String>,
    /// Directory the simulator runs in
    pub working_dir: PathBuf,
}

impl SimulationRequest {
    /// Create a request
    #[must_use]
    pub fn new(
        rpc_url: impl Into<String>,
        command: Vec<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            command,
            working_dir: working_dir.into(),
        }
    }
}

/// Runs a simulator and returns the effect it observed
///
/// Implementations must leave no process behind, whether the call
/// completes, times out, or its future is dropped.
#[async_trait]
pub trait SimulationClient: Send + Sync + std::fmt::Debug {
    /// Execute the request
    ///
    /// # Errors
    /// Returns a [`crate::SimulationError`] for spawn failures, timeouts,
    /// nonzero exits and rejected reports
    async fn simulate(&self, request: SimulationRequest) -> SimulationResult<Effect>;
}
