//! Upgrade Validator Reconciliation
//!
//! Diffs the effect an upgrade author declared against the effect the
//! simulator observed.
//!
//! # Rules
//!
//! - entries are matched by key, never by position
//!   (`address + slot` for overrides and changes, `address` for balances)
//! - values are compared semantically: hex is case-insensitive, storage
//!   words ignore zero padding, balances compare numerically
//! - a state change declared with `allowDifference` matches on key alone
//! - hashes are compared only when the author asserted them
//!
//! The verdict passes iff no category has missing, unexpected or mismatched
//! entries. The itemized breakdown is always returned.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod engine;
pub mod error;
pub mod keyed;
pub mod verdict;

pub use engine::{reconcile, ReconciliationEngine};
pub use error::{ReconcileError, Side};
pub use keyed::{Category, HashesKey, Keyed};
pub use verdict::{CategoryDiff, Counts, Entry, Outcome, Pair, ReconciliationVerdict};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
