//! Simulator invocation settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default simulation timeout (5 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default cap per captured stream (4 MiB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

/// Where the simulator delivers its report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    /// The whole of standard output is the report
    Stdout,
    /// Written to the path named by the report env var
    #[default]
    File,
}

/// Settings for [`crate::ProcessSimulator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Hard wall-clock limit in seconds
    pub timeout_secs: u64,
    /// Environment variable carrying the RPC URL
    pub rpc_url_env: String,
    /// Report delivery channel
    pub report: ReportSource,
    /// Environment variable carrying the report path
    pub report_path_env: String,
    /// Pass the parent environment through
    pub inherit_env: bool,
    /// Cap per captured stream
    pub max_output_bytes: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            rpc_url_env: "RPC_URL".to_string(),
            report: ReportSource::File,
            report_path_env: "SIMULATION_REPORT_PATH".to_string(),
            inherit_env: true,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl SimulationSettings {
    /// Timeout as a duration
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set report channel
    #[must_use]
    pub fn with_report(mut self, report: ReportSource) -> Self {
        self.report = report;
        self
    }

    /// Set environment inheritance
    #[must_use]
    pub fn with_inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    /// Set output cap
    #[must_use]
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Set RPC variable name
    #[must_use]
    pub fn with_rpc_url_env(mut self, name: impl Into<String>) -> Self {
        self.rpc_url_env = name.into();
        self
    }
}
