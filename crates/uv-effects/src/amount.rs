//! Native-asset amounts
//!
//! [`Amount`] accepts JSON integers, decimal strings and `0x` hex strings,
//! and compares numerically so `"100"`, `100` and `"0x64"` are the same.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Signed amount in the chain's smallest unit (wei)
///
/// Balances before and after are non-negative in practice; deltas may be
/// negative. The literal is retained for display.
#[derive(Debug, Clone)]
pub struct Amount {
    value: i128,
    raw: String,
}

impl Amount {
    /// Create from a number
    #[inline]
    #[must_use]
    pub fn new(value: i128) -> Self {
        Self {
            value,
            raw: value.to_string(),
        }
    }

    /// Numeric value
    #[inline]
    #[must_use]
    pub const fn value(&self) -> i128 {
        self.value
    }

    /// Literal as written
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parse a decimal or `0x` hex literal with an optional leading `-`
    ///
    /// # Errors
    /// Returns error if the literal is malformed or does not fit in 128 bits
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let magnitude = if let Some(hex) = unsigned
            .strip_prefix("0x")
            .or_else(|| unsigned.strip_prefix("0X"))
        {
            if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(AmountError::Malformed(s.to_string()));
            }
            i128::from_str_radix(hex, 16)
        } else {
            if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AmountError::Malformed(s.to_string()));
            }
            unsigned.parse::<i128>()
        }
        .map_err(|e| match e.kind() {
            std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                AmountError::Overflow(s.to_string())
            }
            _ => AmountError::Malformed(s.to_string()),
        })?;

        Ok(Self {
            value: if negative { -magnitude } else { magnitude },
            raw: s.to_string(),
        })
    }

    /// Difference `self - earlier`, if it fits
    #[inline]
    #[must_use]
    pub fn checked_sub(&self, earlier: &Self) -> Option<Self> {
        self.value.checked_sub(earlier.value).map(Self::new)
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Amount {}

impl Hash for Amount {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i128> for Amount {
    fn from(value: i128) -> Self {
        Self::new(value)
    }
}

impl serde::Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        use serde::Deserialize;
        use serde_json::Value;

        // Numbers keep their literal text, so wei-scale integers above
        // u64::MAX arrive intact.
        match Value::deserialize(deserializer)? {
            Value::Number(n) if n.is_f64() => {
                Err(D::Error::custom(AmountError::NotInteger(n.to_string())))
            }
            Value::Number(n) => n.to_string().parse().map_err(D::Error::custom),
            Value::String(s) => s.parse().map_err(D::Error::custom),
            other => Err(D::Error::invalid_type(
                unexpected(&other),
                &"an integer, a decimal string or a 0x hex string",
            )),
        }
    }
}

fn unexpected(value: &serde_json::Value) -> serde::de::Unexpected<'_> {
    use serde::de::Unexpected;
    use serde_json::Value;

    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
        Value::Number(_) | Value::String(_) => Unexpected::Other("amount"),
    }
}

/// Errors when parsing amounts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Not a decimal or hex integer
    #[error("malformed amount '{0}'")]
    Malformed(String),

    /// Does not fit in 128 bits
    #[error("amount '{0}' is out of range")]
    Overflow(String),

    /// Floating point JSON number
    #[error("amount {0} is not an integer; write large values as strings")]
    NotInteger(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(Amount::parse("100").unwrap().value(), 100);
        assert_eq!(Amount::parse("0x64").unwrap().value(), 100);
        assert_eq!(Amount::parse("-0x64").unwrap().value(), -100);
        assert_eq!(Amount::parse("-5").unwrap().value(), -5);
    }

    #[test]
    fn numeric_equality_ignores_formatting() {
        let a = Amount::parse("0x64").unwrap();
        let b = Amount::parse("100").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0x64");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(Amount::parse("12a"), Err(AmountError::Malformed(_))));
        assert!(matches!(Amount::parse(""), Err(AmountError::Malformed(_))));
        assert!(matches!(Amount::parse("0x"), Err(AmountError::Malformed(_))));
        assert!(matches!(Amount::parse("+5"), Err(AmountError::Malformed(_))));
    }

    #[test]
    fn rejects_overflow() {
        let huge = "9".repeat(60);
        assert!(matches!(Amount::parse(&huge), Err(AmountError::Overflow(_))));
    }

    #[test]
    fn wei_scale_fits() {
        // 120M ether in wei
        let supply = Amount::parse("120000000000000000000000000").unwrap();
        assert!(supply.value() > 0);
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let n: Amount = serde_json::from_str("200").unwrap();
        let s: Amount = serde_json::from_str("\"200\"").unwrap();
        let h: Amount = serde_json::from_str("\"0xc8\"").unwrap();
        assert_eq!(n, s);
        assert_eq!(s, h);
    }

    #[test]
    fn rejects_float() {
        let result: Result<Amount, _> = serde_json::from_str("1.5");
        assert!(result.is_err());
        let result: Result<Amount, _> = serde_json::from_str("1e20");
        assert!(result.is_err());
    }

    #[test]
    fn integers_beyond_u64_deserialize() {
        // 100 ether in wei
        let n: Amount = serde_json::from_str("100000000000000000000").unwrap();
        assert_eq!(n.value(), 100_000_000_000_000_000_000);
        assert_eq!(n.as_str(), "100000000000000000000");
        assert_eq!(n, Amount::parse("0x56bc75e2d63100000").unwrap());

        let negative: Amount = serde_json::from_str("-100000000000000000000").unwrap();
        assert_eq!(negative.value(), -100_000_000_000_000_000_000);
    }

    #[test]
    fn integers_beyond_i128_overflow() {
        let huge = "9".repeat(60);
        let err = serde_json::from_str::<Amount>(&huge).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn rejects_other_json_types() {
        assert!(serde_json::from_str::<Amount>("true").is_err());
        assert!(serde_json::from_str::<Amount>("null").is_err());
        assert!(serde_json::from_str::<Amount>("[1]").is_err());
    }

    #[test]
    fn checked_sub() {
        let before = Amount::new(1_000);
        let after = Amount::new(400);
        assert_eq!(after.checked_sub(&before).unwrap().value(), -600);
    }
}
