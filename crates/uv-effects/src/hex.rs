//! Hex-encoded chain values
//!
//! Provides [`HexString`] for addresses and hashes, and [`StorageWord`] for
//! 256-bit storage slots and values. Both keep the literal they were parsed
//! from for display, and compare on a canonical form.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Maximum number of hex digits in a storage word (32 bytes)
pub const WORD_HEX_DIGITS: usize = 64;

/// Validate a `0x`-prefixed hex literal and return its digit part
fn hex_digits(s: &str) -> Result<&str, HexError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| HexError::MissingPrefix(s.to_string()))?;

    if digits.is_empty() {
        return Err(HexError::Empty);
    }

    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidDigit {
            literal: s.to_string(),
            digit: bad,
        });
    }

    Ok(digits)
}

/// Case-insensitive hex string (addresses, domain and message hashes)
///
/// Two values are equal when their digits match ignoring case.
/// Length is not normalized: `0x0a` and `0xa` are different addresses.
#[derive(Debug, Clone)]
pub struct HexString {
    raw: String,
    canonical: String,
}

impl HexString {
    /// Parse a `0x`-prefixed hex literal
    ///
    /// # Errors
    /// Returns error if the prefix is missing, no digits follow, or a
    /// non-hex character is present
    pub fn parse(s: &str) -> Result<Self, HexError> {
        let digits = hex_digits(s)?;
        Ok(Self {
            raw: s.to_string(),
            canonical: format!("0x{}", digits.to_ascii_lowercase()),
        })
    }

    /// Literal as written by the author or simulator
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lowercase form used for comparison and ordering
    #[inline]
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for HexString {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for HexString {}

impl Hash for HexString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for HexString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HexString {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl Display for HexString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for HexString {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 256-bit storage word (slot key or slot value)
///
/// Compared as a number: case and leading zero padding are ignored, so
/// `0x1` equals `0x0000…0001`. Canonical form is lowercase without padding,
/// with zero written as `0x0`.
#[derive(Debug, Clone)]
pub struct StorageWord {
    raw: String,
    canonical: String,
}

impl StorageWord {
    /// Parse a `0x`-prefixed storage word of at most 32 bytes
    ///
    /// # Errors
    /// Returns error on malformed hex or if more than 64 digits are given
    pub fn parse(s: &str) -> Result<Self, HexError> {
        let digits = hex_digits(s)?;
        if digits.len() > WORD_HEX_DIGITS {
            return Err(HexError::TooLong {
                literal: s.to_string(),
                max_digits: WORD_HEX_DIGITS,
            });
        }

        let trimmed = digits.trim_start_matches('0');
        let canonical = if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{}", trimmed.to_ascii_lowercase())
        };

        Ok(Self {
            raw: s.to_string(),
            canonical,
        })
    }

    /// Literal as written
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Unpadded lowercase form
    #[inline]
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Check if the word is zero
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.canonical == "0x0"
    }
}

impl PartialEq for StorageWord {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for StorageWord {}

impl Hash for StorageWord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for StorageWord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StorageWord {
    // Numeric order: shorter canonical digits are smaller
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical
            .len()
            .cmp(&other.canonical.len())
            .then_with(|| self.canonical.cmp(&other.canonical))
    }
}

impl Display for StorageWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for StorageWord {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

macro_rules! string_serde {
    ($ty:ty, $expecting:literal) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.raw)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                struct HexVisitor;

                impl<'de> serde::de::Visitor<'de> for HexVisitor {
                    type Value = $ty;

                    fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                        formatter.write_str($expecting)
                    }

                    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
                    where
                        E: serde::de::Error,
                    {
                        value.parse().map_err(serde::de::Error::custom)
                    }
                }

                deserializer.deserialize_str(HexVisitor)
            }
        }
    };
}

string_serde!(HexString, "a 0x-prefixed hex string");
string_serde!(StorageWord, "a 0x-prefixed 32-byte hex word");

/// Errors when parsing hex literals
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Literal does not start with `0x`
    #[error("hex value '{0}' must start with 0x")]
    MissingPrefix(String),

    /// Only the prefix was given
    #[error("hex value has no digits")]
    Empty,

    /// Non-hex character
    #[error("invalid hex digit '{digit}' in '{literal}'")]
    InvalidDigit { literal: String, digit: char },

    /// Word wider than 32 bytes
    #[error("hex value '{literal}' exceeds {max_digits} digits")]
    TooLong { literal: String, max_digits: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_string_case_insensitive_eq() {
        let a = HexString::parse("0xAbCd").unwrap();
        let b = HexString::parse("0xabcd").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.canonical(), "0xabcd");
        assert_eq!(a.as_str(), "0xAbCd");
    }

    #[test]
    fn hex_string_keeps_length() {
        let a = HexString::parse("0x0a").unwrap();
        let b = HexString::parse("0xa").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hex_string_rejects_missing_prefix() {
        assert!(matches!(
            HexString::parse("abcd"),
            Err(HexError::MissingPrefix(_))
        ));
    }

    #[test]
    fn hex_string_rejects_bad_digit() {
        let err = HexString::parse("0x12g4").unwrap_err();
        assert_eq!(
            err,
            HexError::InvalidDigit {
                literal: "0x12g4".to_string(),
                digit: 'g'
            }
        );
    }

    #[test]
    fn hex_string_rejects_empty() {
        assert_eq!(HexString::parse("0x").unwrap_err(), HexError::Empty);
    }

    #[test]
    fn storage_word_ignores_padding() {
        let short = StorageWord::parse("0x1").unwrap();
        let padded = StorageWord::parse(
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(short, padded);
        assert_eq!(padded.canonical(), "0x1");
    }

    #[test]
    fn storage_word_zero() {
        let zero = StorageWord::parse("0x0000").unwrap();
        assert!(zero.is_zero());
        assert_eq!(zero.canonical(), "0x0");
    }

    #[test]
    fn storage_word_too_long() {
        let literal = format!("0x{}", "1".repeat(65));
        assert!(matches!(
            StorageWord::parse(&literal),
            Err(HexError::TooLong { max_digits: 64, .. })
        ));
    }

    #[test]
    fn storage_word_numeric_order() {
        let two = StorageWord::parse("0x2").unwrap();
        let ten = StorageWord::parse("0x10").unwrap();
        assert!(two < ten);
    }

    #[test]
    fn serde_keeps_literal() {
        let word: StorageWord = serde_json::from_str("\"0x00FF\"").unwrap();
        assert_eq!(word.canonical(), "0xff");
        assert_eq!(serde_json::to_string(&word).unwrap(), "\"0x00FF\"");
    }

    #[test]
    fn serde_rejects_non_string() {
        let result: Result<HexString, _> = serde_json::from_str("42");
        assert!(result.is_err());
    }
}
