//! Task config parsers
//!
//! The store consumes a parser only through [`TaskConfigParser`]: a success
//! flag, a list of diagnostics and, on success, the typed config.

use std::fmt::{self, Display, Formatter};
use uv_effects::TaskConfig;

mod json;

pub use json::JsonTaskConfigParser;

/// Parser converting file contents into a typed task config
///
/// Implement this trait to plug in a different task file format.
pub trait TaskConfigParser: Send + Sync + std::fmt::Debug {
    /// Parse content string
    fn parse(&self, content: &str) -> ParseOutcome;

    /// File extension handled, without the dot
    fn extension(&self) -> &'static str;
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Does not block loading
    Warning,
    /// Parsing failed
    Error,
}

/// A single parser finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Field path (`stateChanges[2]`) or `line:column`, if known
    pub location: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create error diagnostic
    pub fn error(location: Option<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            location,
            message: message.into(),
        }
    }

    /// Create warning diagnostic
    pub fn warning(location: Option<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            location,
            message: message.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of running a parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Whether parsing succeeded
    pub success: bool,
    /// Everything the parser reported
    pub diagnostics: Vec<Diagnostic>,
    /// Typed config, present only on success
    pub config: Option<TaskConfig>,
}

impl ParseOutcome {
    /// Successful outcome
    #[must_use]
    pub fn success(config: TaskConfig, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: true,
            diagnostics,
            config: Some(config),
        }
    }

    /// Failed outcome
    #[must_use]
    pub fn failure(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            success: false,
            diagnostics,
            config: None,
        }
    }

    /// Error diagnostics joined into one line
    #[must_use]
    pub fn summary(&self) -> String {
        let errors: Vec<String> = self
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(ToString::to_string)
            .collect();

        if errors.is_empty() {
            "parser reported failure without diagnostics".to_string()
        } else {
            errors.join("; ")
        }
    }

    /// Warning diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}
