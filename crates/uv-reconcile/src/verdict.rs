//! Reconciliation verdict types
//!
//! Every list is ordered by key, so two verdicts built from the same inputs
//! serialize to identical bytes.

use crate::keyed::{Category, Keyed};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use uv_effects::{BalanceChange, DomainAndMessageHashes, StateChange, StateOverride};

/// Overall result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Every category reconciled cleanly
    Pass,
    /// At least one missing, unexpected or mismatched entry
    Fail,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        })
    }
}

/// Entry present on one side only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound = "")]
pub struct Entry<T: Keyed> {
    /// Identity
    pub key: T::Key,
    /// The entry as declared or observed
    pub value: T,
}

/// Entry present on both sides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound = "", rename_all = "camelCase")]
pub struct Pair<T: Keyed> {
    /// Identity
    pub key: T::Key,
    /// Declared entry
    pub expected: T,
    /// Observed entry
    pub actual: T,
    /// Matched only because the declaration allows a difference
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tolerated: bool,
}

/// Diff of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound = "")]
pub struct CategoryDiff<T: Keyed> {
    /// Same key, semantically equal (or tolerated)
    pub matched: Vec<Pair<T>>,
    /// Expected but not observed
    pub missing: Vec<Entry<T>>,
    /// Observed but not expected
    pub unexpected: Vec<Entry<T>>,
    /// Same key, different value
    pub mismatched: Vec<Pair<T>>,
}

impl<T: Keyed> Default for CategoryDiff<T> {
    fn default() -> Self {
        Self {
            matched: Vec::new(),
            missing: Vec::new(),
            unexpected: Vec::new(),
            mismatched: Vec::new(),
        }
    }
}

impl<T: Keyed> CategoryDiff<T> {
    /// Category of this diff
    #[inline]
    #[must_use]
    pub fn category(&self) -> Category {
        T::CATEGORY
    }

    /// No missing, unexpected or mismatched entries
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.mismatched.is_empty()
    }

    /// Entry counts
    #[must_use]
    pub fn counts(&self) -> Counts {
        Counts {
            matched: self.matched.len(),
            tolerated: self.matched.iter().filter(|p| p.tolerated).count(),
            missing: self.missing.len(),
            unexpected: self.unexpected.len(),
            mismatched: self.mismatched.len(),
        }
    }
}

/// Entry counts of a category or a whole verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// Matched entries, tolerated ones included
    pub matched: usize,
    /// Matched entries whose values differ but were allowed to
    pub tolerated: usize,
    /// Expected only
    pub missing: usize,
    /// Actual only
    pub unexpected: usize,
    /// Differing values
    pub mismatched: usize,
}

impl Counts {
    /// Number of entries that fail the verdict
    #[inline]
    #[must_use]
    pub fn failures(&self) -> usize {
        self.missing + self.unexpected + self.mismatched
    }
}

impl std::ops::Add for Counts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            matched: self.matched + rhs.matched,
            tolerated: self.tolerated + rhs.tolerated,
            missing: self.missing + rhs.missing,
            unexpected: self.unexpected + rhs.unexpected,
            mismatched: self.mismatched + rhs.mismatched,
        }
    }
}

impl Display for Counts {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matched, {} missing, {} unexpected, {} mismatched",
            self.matched, self.missing, self.unexpected, self.mismatched
        )?;
        if self.tolerated > 0 {
            write!(f, " ({} tolerated)", self.tolerated)?;
        }
        Ok(())
    }
}

/// Full reconciliation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationVerdict {
    /// Overall result
    pub outcome: Outcome,
    /// State override diff
    pub overrides: CategoryDiff<StateOverride>,
    /// State change diff
    pub changes: CategoryDiff<StateChange>,
    /// Balance change diff
    pub balances: CategoryDiff<BalanceChange>,
    /// Hash diff; empty when the hashes were not asserted
    pub hashes: CategoryDiff<DomainAndMessageHashes>,
}

impl ReconciliationVerdict {
    /// Assemble a verdict and derive its outcome
    #[must_use]
    pub fn new(
        overrides: CategoryDiff<StateOverride>,
        changes: CategoryDiff<StateChange>,
        balances: CategoryDiff<BalanceChange>,
        hashes: CategoryDiff<DomainAndMessageHashes>,
    ) -> Self {
        let clean =
            overrides.is_clean() && changes.is_clean() && balances.is_clean() && hashes.is_clean();
        Self {
            outcome: if clean { Outcome::Pass } else { Outcome::Fail },
            overrides,
            changes,
            balances,
            hashes,
        }
    }

    /// Check if the verdict passed
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// Counts per category, in report order
    #[must_use]
    pub fn category_counts(&self) -> [(Category, Counts); 4] {
        [
            (Category::StateOverrides, self.overrides.counts()),
            (Category::StateChanges, self.changes.counts()),
            (Category::BalanceChanges, self.balances.counts()),
            (Category::Hashes, self.hashes.counts()),
        ]
    }

    /// Counts across all categories
    #[must_use]
    pub fn totals(&self) -> Counts {
        self.category_counts()
            .into_iter()
            .fold(Counts::default(), |acc, (_, counts)| acc + counts)
    }
}
