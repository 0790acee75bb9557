//! Upgrade Validator Config Layer
//!
//! The trusted boundary between caller-supplied identifiers and the
//! deployments tree on disk.
//!
//! # Core Operations
//!
//! - **Resolve**: join untrusted segments under the deployments root with
//!   [`PathResolver`], which guarantees containment
//! - **Load**: read `<network>/<upgrade>/validations/<name>.json` with
//!   [`ConfigStore`]
//! - **Parse**: turn bytes into a typed [`uv_effects::TaskConfig`] through a
//!   [`TaskConfigParser`]
//!
//! # Architecture
//!
//! ```text
//! (network, upgrade, name) → PathResolver → file → TaskConfigParser → TaskConfig
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use uv_config::{ConfigStore, PathResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ConfigStore::new(PathResolver::new("/srv/contract-deployments")?);
//! let loaded = store.load("mainnet", "2024-06-fault-proofs", "base-sc").await?;
//! println!("{} ({})", loaded.source.relative_path.display(), loaded.source.sha256);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod parser;
pub mod path;
pub mod store;

pub use error::{ConfigError, ConfigResult, PathError};
pub use parser::{Diagnostic, JsonTaskConfigParser, ParseOutcome, Severity, TaskConfigParser};
pub use path::{validate_identifier, PathResolver};
pub use store::{
    ConfigSource, ConfigStore, LoadedTaskConfig, DEFAULT_MAX_FILE_SIZE, VALIDATIONS_DIR,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
