//! Validation orchestrator
//!
//! Runs config loading, simulation and reconciliation strictly in order.
//! The first failure is returned unchanged; a verdict is only produced
//! when both the expected and the actual side are available.

use crate::error::ValidationError;
use crate::settings::{find_contract_deployments_root, SettingsError, ValidatorSettings};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Instrument};
use ulid::Ulid;
use uv_config::{ConfigSource, ConfigStore, LoadedTaskConfig, PathResolver};
use uv_effects::Effect;
use uv_reconcile::{ReconciliationEngine, ReconciliationVerdict};
use uv_simulation::{ProcessSimulator, SimulationClient, SimulationRequest};

/// What to validate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// Network directory, e.g. `mainnet`
    pub network: String,
    /// Upgrade directory under the network
    pub upgrade_id: String,
    /// Task config name without extension
    pub task_config_name: String,
}

impl ValidationRequest {
    /// Create a request
    #[must_use]
    pub fn new(
        network: impl Into<String>,
        upgrade_id: impl Into<String>,
        task_config_name: impl Into<String>,
    ) -> Self {
        Self {
            network: network.into(),
            upgrade_id: upgrade_id.into(),
            task_config_name: task_config_name.into(),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    /// Unique id of this run
    pub run_id: Ulid,
    /// What was validated
    pub request: ValidationRequest,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Task config provenance
    pub source: ConfigSource,
    /// Declared effect
    pub expected: Effect,
    /// Simulated effect
    pub actual: Effect,
    /// Reconciliation result
    pub verdict: ReconciliationVerdict,
}

impl ValidationOutcome {
    /// Check if the verdict passed
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }

    /// Wall-clock duration in milliseconds
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Upgrade validator
///
/// Holds the shared store and simulation client; independent runs may
/// execute concurrently on one instance.
#[derive(Debug, Clone)]
pub struct Validator {
    store: Arc<ConfigStore>,
    simulator: Arc<dyn SimulationClient>,
    engine: ReconciliationEngine,
}

impl Validator {
    /// Create from collaborators
    #[must_use]
    pub fn new(store: Arc<ConfigStore>, simulator: Arc<dyn SimulationClient>) -> Self {
        Self {
            store,
            simulator,
            engine: ReconciliationEngine::new(),
        }
    }

    /// Create with the subprocess simulator, anchored at the configured root
    ///
    /// # Errors
    /// Returns error if a setting is invalid or the deployments root is
    /// unset or unusable
    pub fn from_settings(settings: &ValidatorSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let root = find_contract_deployments_root(settings)?;
        let store = ConfigStore::new(PathResolver::new(&root)?)
            .with_max_file_size(settings.config.max_file_size);

        info!(root = %root.display(), "deployments root resolved");

        Ok(Self::new(
            Arc::new(store),
            Arc::new(ProcessSimulator::new(settings.simulation.clone())),
        ))
    }

    /// Config store in use
    #[inline]
    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Load a task config without simulating
    ///
    /// # Errors
    /// Returns the config stage error
    pub async fn check_config(
        &self,
        request: &ValidationRequest,
    ) -> Result<LoadedTaskConfig, ValidationError> {
        Ok(self
            .store
            .load(
                &request.network,
                &request.upgrade_id,
                &request.task_config_name,
            )
            .await?)
    }

    /// Validate an upgrade end to end
    ///
    /// # Errors
    /// Returns the first stage failure, tagged with its stage and kind
    pub async fn validate_upgrade(
        &self,
        request: ValidationRequest,
    ) -> Result<ValidationOutcome, ValidationError> {
        let run_id = Ulid::new();
        let span = tracing::info_span!(
            "validate_upgrade",
            %run_id,
            network = %request.network,
            upgrade_id = %request.upgrade_id,
            config = %request.task_config_name,
        );

        let result = self.run(run_id, request).instrument(span.clone()).await;
        if let Err(e) = &result {
            span.in_scope(|| {
                warn!(stage = %e.stage(), kind = %e.kind(), error = %e, "validation failed");
            });
        }
        result
    }

    async fn run(
        &self,
        run_id: Ulid,
        request: ValidationRequest,
    ) -> Result<ValidationOutcome, ValidationError> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let loaded = self.check_config(&request).await?;
        let working_dir = self
            .store
            .upgrade_dir(&request.network, &request.upgrade_id)?;
        let expected = loaded.config.expected_effect();
        info!(stage = "config", elapsed_ms = elapsed_ms(clock), "task config loaded");

        let actual = self
            .simulator
            .simulate(SimulationRequest::new(
                loaded.config.rpc_url.clone(),
                loaded.config.command_tokens(),
                working_dir,
            ))
            .await?;
        info!(stage = "simulation", elapsed_ms = elapsed_ms(clock), "simulation finished");

        let verdict = self.engine.reconcile(&expected, &actual)?;
        let totals = verdict.totals();
        info!(
            stage = "reconciliation",
            elapsed_ms = elapsed_ms(clock),
            outcome = %verdict.outcome,
            matched = totals.matched,
            missing = totals.missing,
            unexpected = totals.unexpected,
            mismatched = totals.mismatched,
            "validation complete"
        );

        Ok(ValidationOutcome {
            run_id,
            request,
            started_at,
            finished_at: Utc::now(),
            source: loaded.source,
            expected,
            actual,
            verdict,
        })
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
