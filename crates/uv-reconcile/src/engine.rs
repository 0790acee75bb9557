//! Reconciliation engine
//!
//! Pure and order-insensitive: each category is indexed by key on both
//! sides, then walked in key order.

use crate::error::{ReconcileError, Side};
use crate::keyed::Keyed;
use crate::verdict::{CategoryDiff, Entry, Pair, ReconciliationVerdict};
use std::collections::BTreeMap;
use uv_effects::{DomainAndMessageHashes, Effect};

/// Compares expected and actual effects
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Create new engine
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reconcile expected against actual
    ///
    /// # Errors
    /// Returns `DuplicateKey` if either side lists one key twice in a category
    pub fn reconcile(
        &self,
        expected: &Effect,
        actual: &Effect,
    ) -> Result<ReconciliationVerdict, ReconcileError> {
        let verdict = ReconciliationVerdict::new(
            diff(&expected.state_overrides, &actual.state_overrides)?,
            diff(&expected.state_changes, &actual.state_changes)?,
            diff(&expected.balance_changes, &actual.balance_changes)?,
            diff_hashes(
                expected.domain_and_message_hashes.as_ref(),
                actual.domain_and_message_hashes.as_ref(),
            ),
        );

        tracing::debug!(
            outcome = %verdict.outcome,
            totals = %verdict.totals(),
            "reconciled effects"
        );

        Ok(verdict)
    }
}

/// Reconcile with a default engine
///
/// # Errors
/// See [`ReconciliationEngine::reconcile`]
pub fn reconcile(
    expected: &Effect,
    actual: &Effect,
) -> Result<ReconciliationVerdict, ReconcileError> {
    ReconciliationEngine::new().reconcile(expected, actual)
}

fn index<T: Keyed>(entries: &[T], side: Side) -> Result<BTreeMap<T::Key, &T>, ReconcileError> {
    let mut map = BTreeMap::new();
    for entry in entries {
        let key = entry.key();
        if map.contains_key(&key) {
            return Err(ReconcileError::duplicate_key(side, T::CATEGORY, key));
        }
        map.insert(key, entry);
    }
    Ok(map)
}

fn diff<T: Keyed>(expected: &[T], actual: &[T]) -> Result<CategoryDiff<T>, ReconcileError> {
    let expected = index(expected, Side::Expected)?;
    let mut actual = index(actual, Side::Actual)?;
    let mut out = CategoryDiff::default();

    for (key, want) in expected {
        let Some(got) = actual.remove(&key) else {
            out.missing.push(Entry {
                key,
                value: want.clone(),
            });
            continue;
        };

        let equal = want.semantically_eq(got);
        let pair = Pair {
            key,
            expected: want.clone(),
            actual: got.clone(),
            tolerated: !equal && want.tolerates_difference(),
        };
        if equal || pair.tolerated {
            out.matched.push(pair);
        } else {
            out.mismatched.push(pair);
        }
    }

    out.unexpected = actual
        .into_iter()
        .map(|(key, value)| Entry {
            key,
            value: value.clone(),
        })
        .collect();

    Ok(out)
}

/// Unasserted hashes produce no entries, whatever the simulator reported
fn diff_hashes(
    expected: Option<&DomainAndMessageHashes>,
    actual: Option<&DomainAndMessageHashes>,
) -> CategoryDiff<DomainAndMessageHashes> {
    let Some(expected) = expected else {
        return CategoryDiff::default();
    };
    let actual: Vec<DomainAndMessageHashes> = actual.into_iter().cloned().collect();

    // At most one entry per side, so keys cannot collide.
    diff(std::slice::from_ref(expected), &actual).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyed::Category;
    use crate::verdict::Outcome;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn effect(value: serde_json::Value) -> Effect {
        serde_json::from_value(value).unwrap()
    }

    fn hashes(domain: &str) -> serde_json::Value {
        json!({"address": "0xC", "domainHash": domain, "messageHash": "0x02"})
    }

    #[test]
    fn identical_effects_all_match() {
        let x = effect(json!({
            "stateOverrides": [{"address": "0xA", "key": "0x4", "value": "0x1"}],
            "stateChanges": [
                {"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x1"},
                {"address": "0xA", "slot": "0x2", "before": "0x0", "after": "0x2"}
            ],
            "balanceChanges": [{"address": "0xB", "delta": 100}],
            "domainAndMessageHashes": hashes("0x01")
        }));

        let verdict = reconcile(&x, &x).unwrap();
        assert_eq!(verdict.outcome, Outcome::Pass);
        let totals = verdict.totals();
        assert_eq!(totals.matched, 5);
        assert_eq!(totals.failures(), 0);
    }

    #[test]
    fn missing_state_change() {
        let expected = effect(json!({
            "stateChanges": [{"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x1"}]
        }));
        let actual = effect(json!({"stateChanges": []}));

        let verdict = reconcile(&expected, &actual).unwrap();
        assert!(!verdict.passed());
        assert_eq!(verdict.changes.missing.len(), 1);
        assert_eq!(verdict.changes.missing[0].key.to_string(), "(0xa, 0x1)");
        assert_eq!(verdict.changes.counts().failures(), 1);
    }

    #[test]
    fn unexpected_state_change() {
        let expected = effect(json!({}));
        let actual = effect(json!({
            "stateChanges": [{"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x1"}]
        }));

        let verdict = reconcile(&expected, &actual).unwrap();
        assert_eq!(verdict.changes.unexpected.len(), 1);
        assert!(!verdict.passed());
    }

    #[test]
    fn balance_delta_mismatch_keeps_both_values() {
        let expected = effect(json!({"balanceChanges": [{"address": "0xB", "delta": 100}]}));
        let actual = effect(json!({"balanceChanges": [{"address": "0xB", "delta": 200}]}));

        let verdict = reconcile(&expected, &actual).unwrap();
        assert_eq!(verdict.balances.mismatched.len(), 1);
        let pair = &verdict.balances.mismatched[0];
        assert_eq!(pair.expected.delta.as_ref().unwrap().value(), 100);
        assert_eq!(pair.actual.delta.as_ref().unwrap().value(), 200);
        assert!(!pair.tolerated);
    }

    #[test]
    fn allow_difference_is_tolerated_match() {
        let expected = effect(json!({
            "stateChanges": [{
                "address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x0",
                "allowDifference": true
            }]
        }));
        let actual = effect(json!({
            "stateChanges": [{"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x6650"}]
        }));

        let verdict = reconcile(&expected, &actual).unwrap();
        assert!(verdict.passed());
        assert_eq!(verdict.changes.matched.len(), 1);
        assert!(verdict.changes.matched[0].tolerated);
        assert_eq!(verdict.totals().tolerated, 1);
    }

    #[test]
    fn allow_difference_still_requires_the_slot() {
        let expected = effect(json!({
            "stateChanges": [{
                "address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x0",
                "allowDifference": true
            }]
        }));

        let verdict = reconcile(&expected, &effect(json!({}))).unwrap();
        assert_eq!(verdict.changes.missing.len(), 1);
    }

    #[test]
    fn duplicate_key_names_side_and_category() {
        let expected = effect(json!({
            "stateChanges": [
                {"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x1"},
                {"address": "0xa", "slot": "0x01", "before": "0x0", "after": "0x2"}
            ]
        }));

        let err = reconcile(&expected, &effect(json!({}))).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::DuplicateKey {
                side: Side::Expected,
                category: Category::StateChanges,
                key: "(0xa, 0x1)".to_string(),
            }
        );
    }

    #[test]
    fn unasserted_hashes_produce_no_entries() {
        let expected = effect(json!({}));
        let actual = effect(json!({"domainAndMessageHashes": hashes("0x01")}));

        let verdict = reconcile(&expected, &actual).unwrap();
        assert_eq!(verdict.hashes, CategoryDiff::default());
        assert!(verdict.passed());
    }

    #[test]
    fn asserted_hashes_missing_from_actual() {
        let expected = effect(json!({"expectedDomainAndMessageHashes": hashes("0x01")}));
        let verdict = reconcile(&expected, &effect(json!({}))).unwrap();
        assert_eq!(verdict.hashes.missing.len(), 1);
        assert!(!verdict.passed());
    }

    #[test]
    fn hash_comparison_is_case_insensitive() {
        let expected = effect(json!({"domainAndMessageHashes": hashes("0xAB")}));
        let actual = effect(json!({"domainAndMessageHashes": hashes("0xab")}));
        assert!(reconcile(&expected, &actual).unwrap().passed());

        let actual = effect(json!({"domainAndMessageHashes": hashes("0xac")}));
        let verdict = reconcile(&expected, &actual).unwrap();
        assert_eq!(verdict.hashes.mismatched.len(), 1);
    }

    #[test]
    fn output_lists_are_key_ordered() {
        let expected = effect(json!({
            "stateChanges": [
                {"address": "0xB", "slot": "0x1", "before": "0x0", "after": "0x1"},
                {"address": "0xA", "slot": "0x2", "before": "0x0", "after": "0x1"},
                {"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x1"}
            ]
        }));

        let verdict = reconcile(&expected, &effect(json!({}))).unwrap();
        let keys: Vec<String> = verdict
            .changes
            .missing
            .iter()
            .map(|e| e.key.to_string())
            .collect();
        assert_eq!(keys, ["(0xa, 0x1)", "(0xa, 0x2)", "(0xb, 0x1)"]);
    }
}
