//! Upgrade effect entries
//!
//! An [`Effect`] aggregates the four kinds of observable consequence of an
//! upgrade. The same type describes what the author declared and what the
//! simulator observed, so both sides share key semantics:
//!
//! - overrides and changes are identified by [`SlotKey`] (address + slot)
//! - balance changes are identified by address
//!
//! Overrides and changes may be written grouped per contract
//! (`{ name, address, overrides: [...] }`) or flat (`{ address, slot, ... }`);
//! both are flattened to one entry per slot on deserialization.

use crate::amount::Amount;
use crate::hex::{HexString, StorageWord};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Storage location identifying an override or change
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SlotKey {
    /// Contract address
    pub address: HexString,
    /// Storage slot
    pub slot: StorageWord,
}

impl SlotKey {
    /// Create new key
    #[inline]
    #[must_use]
    pub fn new(address: HexString, slot: StorageWord) -> Self {
        Self { address, slot }
    }
}

impl Display for SlotKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.address.canonical(), self.slot.canonical())
    }
}

/// Storage value injected before simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateOverride {
    /// Contract label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contract address
    pub address: HexString,
    /// Storage slot
    #[serde(alias = "key")]
    pub slot: StorageWord,
    /// Injected value
    pub value: StorageWord,
    /// Reviewer-facing explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StateOverride {
    /// Key identifying this override
    #[inline]
    #[must_use]
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.address.clone(), self.slot.clone())
    }
}

/// Storage mutation caused by the upgrade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    /// Contract label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contract address
    pub address: HexString,
    /// Storage slot
    #[serde(alias = "key")]
    pub slot: StorageWord,
    /// Value before execution
    pub before: StorageWord,
    /// Value after execution
    pub after: StorageWord,
    /// Reviewer-facing explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Values at this slot are allowed to differ from the declaration
    /// (nonces, timestamps); only the presence of the change is asserted
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_difference: bool,
}

impl StateChange {
    /// Key identifying this change
    #[inline]
    #[must_use]
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.address.clone(), self.slot.clone())
    }
}

/// Native-asset balance movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChange {
    /// Account label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Account address
    pub address: HexString,
    /// Asset or field label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Balance before execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Amount>,
    /// Balance after execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Amount>,
    /// Signed movement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Amount>,
    /// Reviewer-facing explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BalanceChange {
    /// Create a delta-only balance change
    #[must_use]
    pub fn with_delta(address: HexString, delta: impl Into<Amount>) -> Self {
        Self {
            name: None,
            address,
            field: None,
            before: None,
            after: None,
            delta: Some(delta.into()),
            description: None,
        }
    }

    /// Create a before/after balance change
    #[must_use]
    pub fn with_balances(
        address: HexString,
        before: impl Into<Amount>,
        after: impl Into<Amount>,
    ) -> Self {
        Self {
            name: None,
            address,
            field: None,
            before: Some(before.into()),
            after: Some(after.into()),
            delta: None,
            description: None,
        }
    }

    /// Movement of the balance: `delta` when given, else `after - before`
    #[must_use]
    pub fn effective_delta(&self) -> Option<Amount> {
        if let Some(delta) = &self.delta {
            return Some(delta.clone());
        }
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => after.checked_sub(before),
            _ => None,
        }
    }

    /// Check the change carries enough information to be compared
    ///
    /// # Errors
    /// Returns error if neither `delta` nor both `before` and `after` are
    /// present, or if a declared `delta` contradicts `after - before`
    pub fn validate(&self) -> Result<(), EffectError> {
        let computed = match (&self.before, &self.after) {
            (Some(before), Some(after)) => Some(after.checked_sub(before).ok_or_else(|| {
                EffectError::DeltaOverflow {
                    address: self.address.to_string(),
                }
            })?),
            _ => None,
        };

        match (&self.delta, computed) {
            (None, None) => Err(EffectError::IncompleteBalance {
                address: self.address.to_string(),
            }),
            (Some(delta), Some(computed)) if *delta != computed => {
                Err(EffectError::InconsistentDelta {
                    address: self.address.to_string(),
                    delta: delta.to_string(),
                    computed: computed.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Typed-data signature commitment produced by the upgrade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAndMessageHashes {
    /// Signing safe or contract
    pub address: HexString,
    /// EIP-712 domain separator
    pub domain_hash: HexString,
    /// EIP-712 message hash
    pub message_hash: HexString,
}

/// Aggregate of everything an upgrade does
///
/// Used for both the declared (expected) and simulated (actual) side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    /// Preconditions written before execution
    #[serde(default, deserialize_with = "deserialize_overrides")]
    pub state_overrides: Vec<StateOverride>,
    /// Storage mutations
    #[serde(default, deserialize_with = "deserialize_changes")]
    pub state_changes: Vec<StateChange>,
    /// Balance movements
    #[serde(default)]
    pub balance_changes: Vec<BalanceChange>,
    /// Signing hashes
    #[serde(
        default,
        alias = "expectedDomainAndMessageHashes",
        skip_serializing_if = "Option::is_none"
    )]
    pub domain_and_message_hashes: Option<DomainAndMessageHashes>,
}

impl Effect {
    /// Check every balance change is comparable
    ///
    /// # Errors
    /// Returns the first invalid balance change
    pub fn validate(&self) -> Result<(), EffectError> {
        self.balance_changes
            .iter()
            .try_for_each(BalanceChange::validate)
    }

    /// Total number of entries across categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.state_overrides.len()
            + self.state_changes.len()
            + self.balance_changes.len()
            + usize::from(self.domain_and_message_hashes.is_some())
    }

    /// Check if the effect declares nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverrideGroup {
    #[serde(default)]
    name: Option<String>,
    address: HexString,
    overrides: Vec<SlotOverride>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotOverride {
    #[serde(alias = "slot")]
    key: StorageWord,
    value: StorageWord,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeGroup {
    #[serde(default)]
    name: Option<String>,
    address: HexString,
    changes: Vec<SlotChange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotChange {
    #[serde(alias = "slot")]
    key: StorageWord,
    before: StorageWord,
    after: StorageWord,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    allow_difference: bool,
}

/// Deserialize grouped or flat overrides into one entry per slot
///
/// # Errors
/// Reports the index of the first malformed entry
pub fn deserialize_overrides<'de, D>(deserializer: D) -> Result<Vec<StateOverride>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    let mut out = Vec::with_capacity(raw.len());

    for (i, entry) in raw.into_iter().enumerate() {
        let at = |e: serde_json::Error| -> D::Error {
            serde::de::Error::custom(format!("stateOverrides[{i}]: {e}"))
        };
        if entry.get("overrides").is_some() {
            let group: OverrideGroup = serde_json::from_value(entry).map_err(at)?;
            out.extend(group.overrides.into_iter().map(|o| StateOverride {
                name: group.name.clone(),
                address: group.address.clone(),
                slot: o.key,
                value: o.value,
                description: o.description,
            }));
        } else {
            out.push(serde_json::from_value(entry).map_err(at)?);
        }
    }

    Ok(out)
}

/// Deserialize grouped or flat changes into one entry per slot
///
/// # Errors
/// Reports the index of the first malformed entry
pub fn deserialize_changes<'de, D>(deserializer: D) -> Result<Vec<StateChange>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    let mut out = Vec::with_capacity(raw.len());

    for (i, entry) in raw.into_iter().enumerate() {
        let at = |e: serde_json::Error| -> D::Error {
            serde::de::Error::custom(format!("stateChanges[{i}]: {e}"))
        };
        if entry.get("changes").is_some() {
            let group: ChangeGroup = serde_json::from_value(entry).map_err(at)?;
            out.extend(group.changes.into_iter().map(|c| StateChange {
                name: group.name.clone(),
                address: group.address.clone(),
                slot: c.key,
                before: c.before,
                after: c.after,
                description: c.description,
                allow_difference: c.allow_difference,
            }));
        } else {
            out.push(serde_json::from_value(entry).map_err(at)?);
        }
    }

    Ok(out)
}

/// Errors in effect entries that parse but cannot be compared
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    /// Neither delta nor before/after given
    #[error("balance change for {address} needs either delta or both before and after")]
    IncompleteBalance { address: String },

    /// `after - before` does not fit
    #[error("balance change for {address} overflows")]
    DeltaOverflow { address: String },

    /// Declared delta disagrees with before/after
    #[error("balance change for {address} declares delta {delta} but before/after give {computed}")]
    InconsistentDelta {
        address: String,
        delta: String,
        computed: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hex(s: &str) -> HexString {
        s.parse().unwrap()
    }

    #[test]
    fn flat_and_grouped_changes_flatten_alike() {
        let grouped: Effect = serde_json::from_value(json!({
            "stateChanges": [{
                "name": "Proxy",
                "address": "0xA",
                "changes": [
                    {"key": "0x1", "before": "0x0", "after": "0x1"},
                    {"key": "0x2", "before": "0x0", "after": "0x2", "allowDifference": true}
                ]
            }]
        }))
        .unwrap();

        let flat: Effect = serde_json::from_value(json!({
            "stateChanges": [
                {"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x1"},
                {"address": "0xa", "key": "0x02", "before": "0x0", "after": "0x2"}
            ]
        }))
        .unwrap();

        assert_eq!(grouped.state_changes.len(), 2);
        assert_eq!(flat.state_changes.len(), 2);
        assert_eq!(grouped.state_changes[0].key(), flat.state_changes[0].key());
        assert_eq!(grouped.state_changes[1].key(), flat.state_changes[1].key());
        assert_eq!(grouped.state_changes[0].name.as_deref(), Some("Proxy"));
        assert!(grouped.state_changes[1].allow_difference);
    }

    #[test]
    fn grouped_overrides_flatten() {
        let effect: Effect = serde_json::from_value(json!({
            "stateOverrides": [{
                "name": "Safe",
                "address": "0xB",
                "overrides": [{"key": "0x4", "value": "0x1", "description": "threshold"}]
            }]
        }))
        .unwrap();

        let o = &effect.state_overrides[0];
        assert_eq!(o.key(), SlotKey::new(hex("0xb"), "0x4".parse().unwrap()));
        assert_eq!(o.description.as_deref(), Some("threshold"));
    }

    #[test]
    fn malformed_entry_reports_index() {
        let err = serde_json::from_value::<Effect>(json!({
            "stateChanges": [
                {"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x1"},
                {"address": "nothex", "slot": "0x1", "before": "0x0", "after": "0x1"}
            ]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("stateChanges[1]"));
    }

    #[test]
    fn hashes_alias() {
        let effect: Effect = serde_json::from_value(json!({
            "expectedDomainAndMessageHashes": {
                "address": "0xC",
                "domainHash": "0xaa",
                "messageHash": "0xbb"
            }
        }))
        .unwrap();
        assert!(effect.domain_and_message_hashes.is_some());
    }

    #[test]
    fn effective_delta_prefers_declared() {
        let change = BalanceChange::with_delta(hex("0xB"), 100i128);
        assert_eq!(change.effective_delta().unwrap().value(), 100);

        let change = BalanceChange::with_balances(hex("0xB"), 50i128, 20i128);
        assert_eq!(change.effective_delta().unwrap().value(), -30);
    }

    #[test]
    fn balance_validation() {
        let mut change = BalanceChange::with_balances(hex("0xB"), 50i128, 20i128);
        assert!(change.validate().is_ok());

        change.delta = Some(Amount::new(5));
        assert!(matches!(
            change.validate(),
            Err(EffectError::InconsistentDelta { .. })
        ));

        change.before = None;
        assert!(change.validate().is_ok());

        change.delta = None;
        assert!(matches!(
            change.validate(),
            Err(EffectError::IncompleteBalance { .. })
        ));
    }

    #[test]
    fn effect_len() {
        let mut effect = Effect::default();
        assert!(effect.is_empty());
        effect
            .balance_changes
            .push(BalanceChange::with_delta(hex("0xB"), 1i128));
        assert_eq!(effect.len(), 1);
    }
}
