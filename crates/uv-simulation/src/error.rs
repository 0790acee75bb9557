//! Error types for simulator invocation

use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Number of trailing stderr lines shown in error messages
const STDERR_TAIL_LINES: usize = 20;

/// Bounded capture of a subprocess stream
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CapturedOutput {
    /// Captured text, lossily decoded
    pub text: String,
    /// Whether output beyond the cap was discarded
    pub truncated: bool,
}

impl CapturedOutput {
    /// Create from text
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>, truncated: bool) -> Self {
        Self {
            text: text.into(),
            truncated,
        }
    }

    /// Last lines of the capture
    #[must_use]
    pub fn tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.text.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }

    /// Check if nothing was captured
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Display for CapturedOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if self.truncated {
            f.write_str("\n[output truncated]")?;
        }
        Ok(())
    }
}

/// Errors from running the simulator
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Command template had no tokens
    #[error("simulation command is empty")]
    EmptyCommand,

    /// Simulator binary could not be started
    #[error("failed to start simulator '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Simulator exceeded its time budget and was killed
    #[error("simulation timed out after {}s", timeout.as_secs())]
    Timeout { timeout: Duration },

    /// Simulator exited unsuccessfully
    #[error("simulation failed ({status}):\n{}", stderr.tail(STDERR_TAIL_LINES))]
    Failed {
        status: String,
        stdout: CapturedOutput,
        stderr: CapturedOutput,
    },

    /// Simulator succeeded but its report failed validation
    #[error("simulation report rejected: {reason}")]
    InvalidReport {
        reason: String,
        stdout: CapturedOutput,
        stderr: CapturedOutput,
    },

    /// Local IO failure around the subprocess
    #[error("io error during simulation: {0}")]
    Io(#[from] std::io::Error),
}

impl SimulationError {
    /// Create report error with the captured streams
    pub fn invalid_report(
        reason: impl Into<String>,
        stdout: CapturedOutput,
        stderr: CapturedOutput,
    ) -> Self {
        Self::InvalidReport {
            reason: reason.into(),
            stdout,
            stderr,
        }
    }

    /// Check if the simulator hit its time budget
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Captured standard error, when the simulator ran to completion
    #[must_use]
    pub fn stderr(&self) -> Option<&CapturedOutput> {
        match self {
            Self::Failed { stderr, .. } | Self::InvalidReport { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Result type alias for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        let out = CapturedOutput::new("a\nb\nc\nd", false);
        assert_eq!(out.tail(2), "c\nd");
        assert_eq!(out.tail(10), "a\nb\nc\nd");
    }

    #[test]
    fn timeout_display() {
        let err = SimulationError::Timeout {
            timeout: Duration::from_secs(300),
        };
        assert_eq!(err.to_string(), "simulation timed out after 300s");
        assert!(err.is_timeout());
    }

    #[test]
    fn failed_display_includes_stderr() {
        let err = SimulationError::Failed {
            status: "exit code 1".to_string(),
            stdout: CapturedOutput::default(),
            stderr: CapturedOutput::new("Error: revert", false),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("Error: revert"));
        assert_eq!(err.stderr().unwrap().text, "Error: revert");
    }

    #[test]
    fn truncated_marker() {
        let out = CapturedOutput::new("abc", true);
        assert_eq!(out.to_string(), "abc\n[output truncated]");
    }
}
