//! Full pipeline against shell-script simulators

#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};
use uv_core::{ErrorKind, Stage, ValidationRequest, Validator};
use uv_simulation::{ProcessSimulator, ReportSource, SimulationSettings};
use uv_test_utils::{
    balance_delta, report, report_file_script, state_change, task_config, DeploymentsFixture,
    NETWORK, UPGRADE,
};

fn validator(fixture: &DeploymentsFixture, settings: SimulationSettings) -> Validator {
    Validator::new(
        Arc::new(fixture.store()),
        Arc::new(ProcessSimulator::new(settings)),
    )
}

fn declared() -> (Vec<serde_json::Value>, Vec<serde_json::Value>) {
    (
        vec![state_change("0xA", "0x1", "0x0", "0x1")],
        vec![balance_delta("0xB", -5)],
    )
}

#[tokio::test]
async fn report_file_round_trip_passes() {
    let fixture = DeploymentsFixture::new();
    let (changes, balances) = declared();
    let cmd = fixture.write_simulator(&report_file_script(&report(
        changes.clone(),
        balances.clone(),
    )));
    fixture.write_config("base", &task_config(&cmd, changes, balances));

    let outcome = validator(&fixture, SimulationSettings::default())
        .validate_upgrade(ValidationRequest::new(NETWORK, UPGRADE, "base"))
        .await
        .unwrap();

    assert!(outcome.passed(), "{}", uv_core::render_text(&outcome));
    assert!(outcome.actual.domain_and_message_hashes.is_some());
}

#[tokio::test]
async fn stdout_report_with_drift_fails() {
    let fixture = DeploymentsFixture::new();
    let (changes, balances) = declared();
    let drifted = report(
        vec![state_change("0xA", "0x1", "0x0", "0x2")],
        balances.clone(),
    );
    let cmd = fixture.write_simulator(&format!("cat <<'EOF'\n{drifted}\nEOF"));
    fixture.write_config("base", &task_config(&cmd, changes, balances));

    let outcome = validator(
        &fixture,
        SimulationSettings::default().with_report(ReportSource::Stdout),
    )
    .validate_upgrade(ValidationRequest::new(NETWORK, UPGRADE, "base"))
    .await
    .unwrap();

    assert!(!outcome.passed());
    assert_eq!(outcome.verdict.changes.mismatched.len(), 1);
    assert_eq!(outcome.verdict.balances.matched.len(), 1);
}

#[tokio::test]
async fn crashing_simulator_is_simulation_failed() {
    let fixture = DeploymentsFixture::new();
    let cmd = fixture.write_simulator("echo 'Error: execution reverted' >&2\nexit 3");
    fixture.write_config("base", &task_config(&cmd, vec![], vec![]));

    let err = validator(&fixture, SimulationSettings::default())
        .validate_upgrade(ValidationRequest::new(NETWORK, UPGRADE, "base"))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Simulation);
    assert_eq!(err.kind(), ErrorKind::SimulationFailed);
    let message = err.to_string();
    assert!(message.contains("exit code 3"));
    assert!(message.contains("execution reverted"));
}

#[tokio::test]
async fn slow_simulator_times_out() {
    let fixture = DeploymentsFixture::new();
    let cmd = fixture.write_simulator("sleep 30");
    fixture.write_config("base", &task_config(&cmd, vec![], vec![]));

    let started = Instant::now();
    let err = validator(
        &fixture,
        SimulationSettings::default().with_timeout(Duration::from_secs(1)),
    )
    .validate_upgrade(ValidationRequest::new(NETWORK, UPGRADE, "base"))
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SimulationTimeout);
    assert!(started.elapsed() < Duration::from_secs(10));
}
