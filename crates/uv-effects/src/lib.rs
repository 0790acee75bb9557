//! Upgrade Effects
//!
//! Typed description of what a contract upgrade does to chain state.
//!
//! # Core Concepts
//!
//! - [`Effect`]: state overrides, state changes, balance changes and signing
//!   hashes, used for both the declared and the simulated side
//! - [`TaskConfig`]: the author's task file (simulation command, RPC URL and
//!   expected effect)
//! - [`HexString`] / [`StorageWord`]: hex values with semantic equality
//! - [`Amount`]: numeric balance values independent of literal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use uv_effects::TaskConfig;
//!
//! let config: TaskConfig = serde_json::from_str(&contents)?;
//! let expected = config.expected_effect();
//! println!("{} expected entries", expected.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod amount;
mod effect;
mod hex;
mod task_config;

pub use amount::{Amount, AmountError};
pub use effect::{
    deserialize_changes, deserialize_overrides, BalanceChange, DomainAndMessageHashes, Effect,
    EffectError, SlotKey, StateChange, StateOverride,
};
pub use hex::{HexError, HexString, StorageWord, WORD_HEX_DIGITS};
pub use task_config::TaskConfig;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
