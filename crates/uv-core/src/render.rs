//! Outcome rendering
//!
//! Text for humans, JSON for CI. Both go to stdout; logs go to stderr.

use crate::error::ValidationError;
use crate::validator::ValidationOutcome;
use std::fmt::Write;
use uv_effects::{BalanceChange, DomainAndMessageHashes, StateChange, StateOverride};
use uv_reconcile::{CategoryDiff, Keyed};

/// One-line description of an entry's compared values
pub trait Describe {
    /// Compared values, without the key
    fn describe(&self) -> String;
}

impl Describe for StateOverride {
    fn describe(&self) -> String {
        format!("value {}", self.value)
    }
}

impl Describe for StateChange {
    fn describe(&self) -> String {
        format!("{} -> {}", self.before, self.after)
    }
}

impl Describe for BalanceChange {
    fn describe(&self) -> String {
        let mut out = match self.effective_delta() {
            Some(delta) => format!("delta {}", delta.value()),
            None => "delta ?".to_string(),
        };
        if let (Some(before), Some(after)) = (&self.before, &self.after) {
            let _ = write!(out, " ({} -> {})", before.value(), after.value());
        }
        out
    }
}

impl Describe for DomainAndMessageHashes {
    fn describe(&self) -> String {
        format!(
            "address {} domain {} message {}",
            self.address, self.domain_hash, self.message_hash
        )
    }
}

fn render_category<T: Keyed + Describe>(out: &mut String, diff: &CategoryDiff<T>) {
    let _ = writeln!(out, "{}: {}", diff.category(), diff.counts());

    for entry in &diff.missing {
        let _ = writeln!(out, "  missing     {}  {}", entry.key, entry.value.describe());
    }
    for entry in &diff.unexpected {
        let _ = writeln!(out, "  unexpected  {}  {}", entry.key, entry.value.describe());
    }
    for pair in &diff.mismatched {
        let _ = writeln!(
            out,
            "  mismatched  {}  expected {}, actual {}",
            pair.key,
            pair.expected.describe(),
            pair.actual.describe()
        );
    }
    for pair in diff.matched.iter().filter(|p| p.tolerated) {
        let _ = writeln!(
            out,
            "  tolerated   {}  expected {}, actual {}",
            pair.key,
            pair.expected.describe(),
            pair.actual.describe()
        );
    }
}

/// Human-readable report
#[must_use]
pub fn render_text(outcome: &ValidationOutcome) -> String {
    let mut out = String::new();
    let request = &outcome.request;

    let _ = writeln!(
        out,
        "Upgrade validation {}/{} ({})",
        request.network, request.upgrade_id, request.task_config_name
    );
    let _ = writeln!(out, "run:    {} ({} ms)", outcome.run_id, outcome.elapsed_ms());
    let _ = writeln!(
        out,
        "config: {} sha256:{}",
        outcome.source.relative_path.display(),
        outcome.source.sha256
    );
    out.push('\n');

    let verdict = &outcome.verdict;
    render_category(&mut out, &verdict.overrides);
    render_category(&mut out, &verdict.changes);
    render_category(&mut out, &verdict.balances);
    if outcome.expected.domain_and_message_hashes.is_some() {
        render_category(&mut out, &verdict.hashes);
    } else {
        let _ = writeln!(out, "{}: not asserted", verdict.hashes.category());
    }

    out.push('\n');
    let _ = writeln!(out, "RESULT: {} ({})", verdict.outcome, verdict.totals());
    out
}

/// Machine-readable report
///
/// # Errors
/// Returns error if serialization fails
pub fn render_json(outcome: &ValidationOutcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}

/// One-line error summary with stage and kind
#[must_use]
pub fn render_error(error: &ValidationError) -> String {
    format!("error [{}/{}]: {error}", error.stage(), error.kind())
}
