//! Identity and semantic equality of effect entries

use serde::Serialize;
use std::fmt::{self, Debug, Display, Formatter};
use uv_effects::{
    BalanceChange, DomainAndMessageHashes, HexString, SlotKey, StateChange, StateOverride,
};

/// Reconciliation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Pre-execution storage overrides
    StateOverrides,
    /// Storage mutations
    StateChanges,
    /// Balance movements
    BalanceChanges,
    /// Domain and message hashes
    Hashes,
}

impl Category {
    /// All categories in report order
    pub const ALL: [Self; 4] = [
        Self::StateOverrides,
        Self::StateChanges,
        Self::BalanceChanges,
        Self::Hashes,
    ];

    /// Field name used in reports
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StateOverrides => "stateOverrides",
            Self::StateChanges => "stateChanges",
            Self::BalanceChanges => "balanceChanges",
            Self::Hashes => "domainAndMessageHashes",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry that can be matched across the expected and actual sides
pub trait Keyed: Clone + Debug + Serialize {
    /// Identity within a category
    type Key: Ord + Clone + Debug + Display + Serialize;

    /// Category the entry belongs to
    const CATEGORY: Category;

    /// Identity of this entry
    fn key(&self) -> Self::Key;

    /// Equality of the compared values, ignoring descriptive fields
    fn semantically_eq(&self, other: &Self) -> bool;

    /// Whether a differing value still counts as a match
    fn tolerates_difference(&self) -> bool {
        false
    }
}

impl Keyed for StateOverride {
    type Key = SlotKey;
    const CATEGORY: Category = Category::StateOverrides;

    fn key(&self) -> SlotKey {
        StateOverride::key(self)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Keyed for StateChange {
    type Key = SlotKey;
    const CATEGORY: Category = Category::StateChanges;

    fn key(&self) -> SlotKey {
        StateChange::key(self)
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.before == other.before && self.after == other.after
    }

    fn tolerates_difference(&self) -> bool {
        self.allow_difference
    }
}

impl Keyed for BalanceChange {
    type Key = HexString;
    const CATEGORY: Category = Category::BalanceChanges;

    fn key(&self) -> HexString {
        self.address.clone()
    }

    /// Effective deltas must agree; absolute balances are compared only
    /// where both sides state them.
    fn semantically_eq(&self, other: &Self) -> bool {
        let both_or_skip = |a: &Option<_>, b: &Option<_>| match (a, b) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        };
        self.effective_delta() == other.effective_delta()
            && both_or_skip(&self.before, &other.before)
            && both_or_skip(&self.after, &other.after)
    }
}

/// Single identity of the hash triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashesKey;

impl Display for HashesKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(Category::Hashes.as_str())
    }
}

impl Serialize for HashesKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(Category::Hashes.as_str())
    }
}

impl Keyed for DomainAndMessageHashes {
    type Key = HashesKey;
    const CATEGORY: Category = Category::Hashes;

    fn key(&self) -> HashesKey {
        HashesKey
    }

    fn semantically_eq(&self, other: &Self) -> bool {
        self.address == other.address
            && self.domain_hash == other.domain_hash
            && self.message_hash == other.message_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uv_effects::Amount;

    fn hex(s: &str) -> HexString {
        s.parse().unwrap()
    }

    fn change(address: &str, slot: &str, before: &str, after: &str) -> StateChange {
        serde_json::from_value(serde_json::json!({
            "address": address, "slot": slot, "before": before, "after": after
        }))
        .unwrap()
    }

    #[test]
    fn change_equality_ignores_padding_and_case() {
        let a = change("0xAbC", "0x1", "0x0", "0xFF");
        let b = change(
            "0xabc",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
            "0x00",
            "0x00ff",
        );
        assert_eq!(Keyed::key(&a), Keyed::key(&b));
        assert!(a.semantically_eq(&b));
    }

    #[test]
    fn change_equality_ignores_descriptions() {
        let a = change("0xA", "0x1", "0x0", "0x1");
        let mut b = a.clone();
        b.description = Some("owner".to_string());
        b.name = Some("Proxy".to_string());
        assert!(a.semantically_eq(&b));
    }

    #[test]
    fn balance_delta_against_absolute_balances() {
        let declared = BalanceChange::with_delta(hex("0xB"), 100i128);
        let observed = BalanceChange::with_balances(hex("0xb"), 50i128, 150i128);
        assert!(declared.semantically_eq(&observed));

        let observed = BalanceChange::with_balances(hex("0xB"), 50i128, 250i128);
        assert!(!declared.semantically_eq(&observed));
    }

    #[test]
    fn balance_absolutes_compared_when_both_present() {
        let declared = BalanceChange::with_balances(hex("0xB"), 0i128, 100i128);
        let observed = BalanceChange::with_balances(hex("0xB"), 10i128, 110i128);
        assert!(!declared.semantically_eq(&observed));
    }

    #[test]
    fn balance_amount_formats_are_numeric() {
        let mut declared = BalanceChange::with_delta(hex("0xB"), 0i128);
        declared.delta = Some(Amount::parse("0x64").unwrap());
        let observed = BalanceChange::with_delta(hex("0xB"), 100i128);
        assert!(declared.semantically_eq(&observed));
    }

    #[test]
    fn category_names() {
        let names: Vec<_> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            ["stateOverrides", "stateChanges", "balanceChanges", "domainAndMessageHashes"]
        );
    }
}
