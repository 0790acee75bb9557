//! Upgrade Validator Core
//!
//! Orchestrates one validation run:
//!
//! ```text
//! (network, upgrade, config) → ConfigStore → SimulationClient → ReconciliationEngine
//!                                  │               │                  │
//!                               expected         actual            verdict
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use uv_core::prelude::*;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = ValidatorSettings::new().apply_env()?;
//! let validator = Validator::from_settings(&settings)?;
//!
//! let outcome = validator
//!     .validate_upgrade(ValidationRequest::new("mainnet", "2024-06-fault-proofs", "base-sc"))
//!     .await?;
//! println!("{}", render_text(&outcome));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod render;
pub mod settings;
pub mod validator;

pub use error::{ErrorKind, Stage, ValidationError};
pub use render::{render_error, render_json, render_text, Describe};
pub use settings::{
    find_contract_deployments_root, ConfigSettings, SettingsError, ValidatorSettings,
    DEPLOYMENTS_ROOT_ENV, TIMEOUT_ENV,
};
pub use validator::{ValidationOutcome, ValidationRequest, Validator};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running validations
    pub use crate::{
        render_json, render_text, ErrorKind, Stage, ValidationError, ValidationOutcome,
        ValidationRequest, Validator, ValidatorSettings,
    };
    pub use uv_reconcile::{Outcome, ReconciliationVerdict};
    pub use uv_simulation::{ProcessSimulator, SimulationClient, SimulationSettings};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
