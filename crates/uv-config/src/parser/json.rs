//! JSON task config parser
//!
//! Uses serde_json in two passes: a structural pass over the raw value that
//! collects every problem it can find, then a typed pass into
//! [`TaskConfig`] once the structure is sound.

use super::{Diagnostic, ParseOutcome, TaskConfigParser};
use serde_json::{Map, Value};
use uv_effects::TaskConfig;

const KNOWN_FIELDS: &[&str] = &[
    "cmd",
    "rpcUrl",
    "stateOverrides",
    "stateChanges",
    "balanceChanges",
    "expectedDomainAndMessageHashes",
];

const RPC_SCHEMES: &[&str] = &["http://", "https://", "ws://", "wss://"];

/// JSON parser
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTaskConfigParser;

impl JsonTaskConfigParser {
    /// Create new JSON parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn check_structure(root: &Map<String, Value>, diagnostics: &mut Vec<Diagnostic>) {
        match root.get("cmd") {
            Some(Value::String(cmd)) if cmd.split_whitespace().next().is_none() => {
                diagnostics.push(Diagnostic::error(Some("cmd".into()), "must not be empty"));
            }
            Some(Value::String(_)) => {}
            Some(_) => diagnostics.push(Diagnostic::error(Some("cmd".into()), "must be a string")),
            None => diagnostics.push(Diagnostic::error(None, "missing required field 'cmd'")),
        }

        match root.get("rpcUrl") {
            Some(Value::String(url)) if !RPC_SCHEMES.iter().any(|s| url.starts_with(s)) => {
                diagnostics.push(Diagnostic::error(
                    Some("rpcUrl".into()),
                    "must be an http(s) or ws(s) URL",
                ));
            }
            Some(Value::String(_)) => {}
            Some(_) => {
                diagnostics.push(Diagnostic::error(Some("rpcUrl".into()), "must be a string"));
            }
            None => diagnostics.push(Diagnostic::error(None, "missing required field 'rpcUrl'")),
        }

        for field in ["stateOverrides", "stateChanges"] {
            match root.get(field) {
                Some(Value::Array(_)) => {}
                Some(_) => {
                    diagnostics.push(Diagnostic::error(Some(field.into()), "must be an array"));
                }
                None => diagnostics.push(Diagnostic::error(
                    None,
                    format!("missing required field '{field}'"),
                )),
            }
        }

        match root.get("balanceChanges") {
            None | Some(Value::Array(_)) => {}
            Some(_) => diagnostics.push(Diagnostic::error(
                Some("balanceChanges".into()),
                "must be an array",
            )),
        }

        match root.get("expectedDomainAndMessageHashes") {
            None | Some(Value::Object(_)) => {}
            Some(_) => diagnostics.push(Diagnostic::error(
                Some("expectedDomainAndMessageHashes".into()),
                "must be an object",
            )),
        }

        for key in root.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                diagnostics.push(Diagnostic::warning(
                    Some(key.clone()),
                    "unknown field is ignored",
                ));
            }
        }
    }

    fn check_semantics(config: &TaskConfig, diagnostics: &mut Vec<Diagnostic>) {
        for (i, balance) in config.balance_changes.iter().enumerate() {
            if let Err(e) = balance.validate() {
                diagnostics.push(Diagnostic::error(
                    Some(format!("balanceChanges[{i}]")),
                    e.to_string(),
                ));
            }
        }
    }
}

impl TaskConfigParser for JsonTaskConfigParser {
    fn parse(&self, content: &str) -> ParseOutcome {
        let mut diagnostics = Vec::new();

        let value: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    Some(format!("{}:{}", e.line(), e.column())),
                    format!("JSON parse error: {e}"),
                ));
                return ParseOutcome::failure(diagnostics);
            }
        };

        let Some(root) = value.as_object() else {
            diagnostics.push(Diagnostic::error(None, "task config must be a JSON object"));
            return ParseOutcome::failure(diagnostics);
        };

        Self::check_structure(root, &mut diagnostics);
        if diagnostics.iter().any(|d| d.severity == super::Severity::Error) {
            return ParseOutcome::failure(diagnostics);
        }

        let config: TaskConfig = match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                diagnostics.push(Diagnostic::error(None, e.to_string()));
                return ParseOutcome::failure(diagnostics);
            }
        };

        Self::check_semantics(&config, &mut diagnostics);
        if diagnostics.iter().any(|d| d.severity == super::Severity::Error) {
            return ParseOutcome::failure(diagnostics);
        }

        ParseOutcome::success(config, diagnostics)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Severity;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "cmd": "forge script Upgrade.s.sol",
            "rpcUrl": "https://rpc.example",
            "stateOverrides": [],
            "stateChanges": [
                {"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x1"}
            ],
            "balanceChanges": [
                {"address": "0xB", "delta": 100}
            ]
        })
    }

    #[test]
    fn parses_valid_config() {
        let outcome = JsonTaskConfigParser.parse(&valid().to_string());
        assert!(outcome.success);
        let config = outcome.config.unwrap();
        assert_eq!(config.state_changes.len(), 1);
        assert_eq!(config.balance_changes.len(), 1);
    }

    #[test]
    fn invalid_json_reports_position() {
        let outcome = JsonTaskConfigParser.parse(r#"{"cmd": "x", "rpcUrl":}"#);
        assert!(!outcome.success);
        assert!(outcome.config.is_none());
        assert!(outcome.summary().starts_with("1:"));
        assert!(outcome.summary().contains("JSON parse error"));
    }

    #[test]
    fn empty_input_is_failure() {
        let outcome = JsonTaskConfigParser.parse("");
        assert!(!outcome.success);
    }

    #[test]
    fn non_object_root() {
        let outcome = JsonTaskConfigParser.parse("[1, 2]");
        assert!(!outcome.success);
        assert!(outcome.summary().contains("must be a JSON object"));
    }

    #[test]
    fn collects_all_structural_errors() {
        let outcome = JsonTaskConfigParser.parse(
            &json!({"cmd": "   ", "rpcUrl": "file:///etc/passwd", "stateChanges": {}}).to_string(),
        );
        assert!(!outcome.success);
        let errors: Vec<_> = outcome
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 4, "{:?}", outcome.diagnostics);
        let summary = outcome.summary();
        assert!(summary.contains("cmd: must not be empty"));
        assert!(summary.contains("rpcUrl: must be an http(s) or ws(s) URL"));
        assert!(summary.contains("missing required field 'stateOverrides'"));
        assert!(summary.contains("stateChanges: must be an array"));
    }

    #[test]
    fn unknown_fields_warn() {
        let mut value = valid();
        value["reviewer"] = json!("alice");
        let outcome = JsonTaskConfigParser.parse(&value.to_string());
        assert!(outcome.success);
        assert_eq!(outcome.warnings().count(), 1);
    }

    #[test]
    fn typed_errors_surface_entry_index() {
        let mut value = valid();
        value["stateChanges"] = json!([
            {"address": "0xA", "slot": "0x1", "before": "0x0", "after": "0x1"},
            {"address": "0xA", "slot": "zz", "before": "0x0", "after": "0x1"}
        ]);
        let outcome = JsonTaskConfigParser.parse(&value.to_string());
        assert!(!outcome.success);
        assert!(outcome.summary().contains("stateChanges[1]"));
    }

    #[test]
    fn wei_scale_integer_balances_parse() {
        let content = r#"{
            "cmd": "forge script Upgrade.s.sol",
            "rpcUrl": "https://rpc.example",
            "stateOverrides": [],
            "stateChanges": [],
            "balanceChanges": [
                {"address": "0xB", "delta": 100000000000000000000},
                {"address": "0xD", "before": 250000000000000000000, "after": 150000000000000000000}
            ]
        }"#;
        let outcome = JsonTaskConfigParser.parse(content);
        assert!(outcome.success, "{}", outcome.summary());
        let config = outcome.config.unwrap();
        let deltas: Vec<i128> = config
            .balance_changes
            .iter()
            .map(|b| b.effective_delta().unwrap().value())
            .collect();
        assert_eq!(
            deltas,
            vec![100_000_000_000_000_000_000, -100_000_000_000_000_000_000]
        );
    }

    #[test]
    fn incomplete_balance_is_error() {
        let mut value = valid();
        value["balanceChanges"] = json!([{"address": "0xB", "before": "5"}]);
        let outcome = JsonTaskConfigParser.parse(&value.to_string());
        assert!(!outcome.success);
        assert!(outcome.summary().starts_with("balanceChanges[0]:"));
    }
}
