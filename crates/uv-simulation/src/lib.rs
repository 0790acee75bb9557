//! Upgrade Validator Simulation
//!
//! Runs the external simulator against a forked chain and turns its report
//! into an [`uv_effects::Effect`].
//!
//! # Simulator contract
//!
//! - argv is the whitespace-split `cmd`; no shell is involved
//! - cwd is the upgrade directory
//! - the RPC URL arrives in `$RPC_URL` (name configurable), and argv tokens
//!   equal to `$RPC_URL` or `${RPC_URL}` are replaced with it
//! - the report is either all of stdout or the file named by
//!   `$SIMULATION_REPORT_PATH`
//!
//! # Example
//!
//! ```rust,ignore
//! use uv_simulation::{ProcessSimulator, SimulationClient, SimulationRequest, SimulationSettings};
//!
//! let sim = ProcessSimulator::new(SimulationSettings::default());
//! let effect = sim
//!     .simulate(SimulationRequest::new(rpc_url, config.command_tokens(), upgrade_dir))
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod command;
pub mod error;
pub mod process;
pub mod report;
pub mod settings;

pub use client::{SimulationClient, SimulationRequest};
pub use command::CommandLine;
pub use error::{CapturedOutput, SimulationError, SimulationResult};
pub use process::ProcessSimulator;
pub use report::{parse_report, ReportError, REPORT_FILE_NAME};
pub use settings::{
    ReportSource, SimulationSettings, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT_SECS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
