//! Testing utilities for the upgrade validator workspace
//!
//! Fake deployment trees, task config and report builders, and shell-script
//! simulators.

#![allow(missing_docs)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uv_config::{ConfigStore, PathResolver};
use uv_effects::Effect;

pub const NETWORK: &str = "mainnet";
pub const UPGRADE: &str = "2024-06-upgrade";
pub const RPC_URL: &str = "http://127.0.0.1:8545";

/// Temporary `<root>/<network>/<upgrade>/validations/` tree
#[derive(Debug)]
pub struct DeploymentsFixture {
    dir: TempDir,
}

impl DeploymentsFixture {
    pub fn new() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };
        fixture.add_upgrade(NETWORK, UPGRADE);
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn upgrade_dir(&self, network: &str, upgrade: &str) -> PathBuf {
        self.root().join(network).join(upgrade)
    }

    pub fn add_upgrade(&self, network: &str, upgrade: &str) -> PathBuf {
        let dir = self.upgrade_dir(network, upgrade);
        fs::create_dir_all(dir.join(uv_config::VALIDATIONS_DIR)).unwrap();
        dir
    }

    pub fn write_config(&self, name: &str, config: &Value) -> PathBuf {
        self.write_raw_config(name, &serde_json::to_string_pretty(config).unwrap())
    }

    pub fn write_raw_config(&self, name: &str, content: &str) -> PathBuf {
        let path = self
            .upgrade_dir(NETWORK, UPGRADE)
            .join(uv_config::VALIDATIONS_DIR)
            .join(format!("{name}.json"));
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `sim.sh` into the upgrade directory and return its argv
    pub fn write_simulator(&self, body: &str) -> String {
        let path = self.upgrade_dir(NETWORK, UPGRADE).join("sim.sh");
        fs::write(path, format!("set -e\n{body}\n")).unwrap();
        "sh sim.sh".to_string()
    }

    pub fn store(&self) -> ConfigStore {
        ConfigStore::new(PathResolver::new(self.root()).unwrap())
    }
}

impl Default for DeploymentsFixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn state_change(address: &str, slot: &str, before: &str, after: &str) -> Value {
    json!({"address": address, "slot": slot, "before": before, "after": after})
}

pub fn balance_delta(address: &str, delta: i64) -> Value {
    json!({"address": address, "delta": delta})
}

pub fn hashes(address: &str, domain: &str, message: &str) -> Value {
    json!({"address": address, "domainHash": domain, "messageHash": message})
}

/// Task config declaring the given changes
pub fn task_config(cmd: &str, state_changes: Vec<Value>, balance_changes: Vec<Value>) -> Value {
    json!({
        "cmd": cmd,
        "rpcUrl": RPC_URL,
        "stateOverrides": [],
        "stateChanges": state_changes,
        "balanceChanges": balance_changes,
    })
}

/// Simulator report with the given changes and a fixed hash triple
pub fn report(state_changes: Vec<Value>, balance_changes: Vec<Value>) -> Value {
    json!({
        "stateOverrides": [],
        "stateChanges": state_changes,
        "balanceChanges": balance_changes,
        "domainAndMessageHashes": hashes("0xC", "0x01", "0x02"),
    })
}

pub fn effect(value: Value) -> Effect {
    serde_json::from_value(value).unwrap()
}

/// Shell body that writes `report` to the report file
pub fn report_file_script(report: &Value) -> String {
    format!(
        "cat > \"$SIMULATION_REPORT_PATH\" <<'EOF'\n{}\nEOF",
        serde_json::to_string_pretty(report).unwrap()
    )
}
