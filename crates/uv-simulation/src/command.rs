//! Simulator command lines
//!
//! Commands are argv vectors, never shell strings. The configured template
//! is split on whitespace and whole-token `$VAR` / `${VAR}` placeholders for
//! the RPC variable are replaced with the URL. No other expansion happens.

use crate::error::SimulationError;

/// Non-empty argv
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Build from pre-split tokens
    ///
    /// # Errors
    /// Returns `EmptyCommand` if there are no tokens
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, SimulationError> {
        let mut tokens = tokens.into_iter();
        let program = tokens.next().ok_or(SimulationError::EmptyCommand)?;
        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }

    /// Split a template on whitespace
    ///
    /// # Errors
    /// Returns `EmptyCommand` for blank templates
    pub fn tokenize(template: &str) -> Result<Self, SimulationError> {
        Self::from_tokens(template.split_whitespace().map(str::to_string).collect())
    }

    /// Replace whole-token `$name` and `${name}` arguments with `value`
    #[must_use]
    pub fn substitute(mut self, name: &str, value: &str) -> Self {
        let bare = format!("${name}");
        let braced = format!("${{{name}}}");
        for arg in &mut self.args {
            if *arg == bare || *arg == braced {
                *arg = value.to_string();
            }
        }
        self
    }

    /// Program to execute
    #[inline]
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments after the program
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}
