// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::consts::{
    DEFAULT_BROKER_MAX_ATTEMPTS, DEFAULT_BROKER_WORKERS, DEFAULT_FUEL_LEVEL, MAX_FUEL_LEVEL,
    MIN_FUEL_LEVEL,
};
use crate::event::EVENT_TYPE_ANY;

/// Main configuration for the gateway.
///
/// Typically loaded from a YAML file:
///
/// ```yaml
/// runtime:
///   type: wasmtime
///   fuel:
///     default: 100000000
/// projects:
///   - name: demo
///     sign_key: "dev-only-secret"
///     publishers:
///       - key: dev-001
///         name: thermostat
///     applets:
///       - name: handler
///         module: applets/handler.wasm
///         strategies:
///           - event_type: ANY
///             handler: start
/// ```
#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
    pub projects: Vec<ProjectConfig>,
}

/// Which WASM engine variant to build at startup.
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeKind {
    Wasmtime,
    Stub,
}

#[derive(Debug, Deserialize)]
pub struct RuntimeConfig {
    #[serde(rename = "type", default = "default_runtime_kind")]
    pub backend: RuntimeKind,
    #[serde(default)]
    pub fuel: FuelConfig,
}

fn default_runtime_kind() -> RuntimeKind {
    RuntimeKind::Wasmtime
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: RuntimeKind::Wasmtime,
            fuel: FuelConfig::default(),
        }
    }
}

/// Fuel limits for guest execution. All values optional, validated against
/// the built-in security bounds.
#[derive(Debug, Default, Deserialize)]
pub struct FuelConfig {
    pub default: Option<u64>,
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl FuelConfig {
    pub fn get_default(&self) -> u64 {
        self.default.unwrap_or(DEFAULT_FUEL_LEVEL)
    }

    pub fn get_minimum(&self) -> u64 {
        self.minimum.unwrap_or(MIN_FUEL_LEVEL)
    }

    pub fn get_maximum(&self) -> u64 {
        self.maximum.unwrap_or(MAX_FUEL_LEVEL)
    }

    /// Clamp a requested budget to the configured bounds.
    pub fn validate_and_clamp(&self, requested: u64) -> u64 {
        requested.clamp(self.get_minimum(), self.get_maximum())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BrokerConfig {
    pub workers: Option<usize>,
    pub max_attempts: Option<u32>,
}

impl BrokerConfig {
    pub fn get_workers(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_BROKER_WORKERS).max(1)
    }

    pub fn get_max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_BROKER_MAX_ATTEMPTS)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_exp_in")]
    pub exp_in: u64,
    pub sign_key: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub publishers: Vec<PublisherConfig>,
    #[serde(default)]
    pub applets: Vec<AppletConfig>,
}

fn default_issuer() -> String {
    "wasmgate".to_string()
}

fn default_exp_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
pub struct PublisherConfig {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AppletConfig {
    pub name: String,
    /// Path to the WASM module on disk.
    pub module: String,
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Deserialize)]
pub struct StrategyConfig {
    pub event_type: EventTypeSpec,
    pub handler: String,
}

/// Event type in config: a number, or the name `ANY`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum EventTypeSpec {
    Number(u32),
    Name(String),
}

impl EventTypeSpec {
    /// The numeric type, or `None` for an unknown name.
    pub fn resolve(&self) -> Option<u32> {
        match self {
            EventTypeSpec::Number(n) => Some(*n),
            EventTypeSpec::Name(name) if name.eq_ignore_ascii_case("any") => Some(EVENT_TYPE_ANY),
            EventTypeSpec::Name(_) => None,
        }
    }
}

/// Load a config from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let cfg: GatewayConfig = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load and validate a config from a YAML file.
pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
) -> Result<GatewayConfig, Box<dyn std::error::Error>> {
    let cfg = load_config(path)?;

    if let Err(validation_errors) = crate::config::validate_config(&cfg) {
        let error_messages: Vec<String> =
            validation_errors.iter().map(|e| e.to_string()).collect();
        let combined_error = format!(
            "Configuration validation failed:\n{}",
            error_messages.join("\n")
        );
        return Err(combined_error.into());
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
runtime:
  type: wasmtime
  fuel:
    default: 50000000
projects:
  - name: demo
    sign_key: "dev-only-secret"
    env:
      REGION: eu-west-1
    publishers:
      - key: dev-001
        name: thermostat
    applets:
      - name: handler
        module: applets/handler.wasm
        strategies:
          - event_type: ANY
            handler: start
          - event_type: 7
            handler: on_seven
"#;
        let cfg: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.runtime.backend, RuntimeKind::Wasmtime);
        assert_eq!(cfg.runtime.fuel.get_default(), 50_000_000);
        assert_eq!(cfg.projects.len(), 1);

        let project = &cfg.projects[0];
        assert_eq!(project.issuer, "wasmgate");
        assert_eq!(project.exp_in, 3600);
        assert_eq!(project.applets[0].strategies.len(), 2);
        assert_eq!(
            project.applets[0].strategies[0].event_type.resolve(),
            Some(EVENT_TYPE_ANY)
        );
        assert_eq!(
            project.applets[0].strategies[1].event_type.resolve(),
            Some(7)
        );
    }

    #[test]
    fn fuel_defaults_and_clamping() {
        let fuel = FuelConfig::default();
        assert_eq!(fuel.get_default(), DEFAULT_FUEL_LEVEL);
        assert_eq!(fuel.validate_and_clamp(1), MIN_FUEL_LEVEL);
        assert_eq!(fuel.validate_and_clamp(u64::MAX), MAX_FUEL_LEVEL);
        assert_eq!(fuel.validate_and_clamp(2_000_000), 2_000_000);
    }

    #[test]
    fn unknown_event_type_name_does_not_resolve() {
        assert_eq!(
            EventTypeSpec::Name("SOMETIMES".to_string()).resolve(),
            None
        );
        assert_eq!(
            EventTypeSpec::Name("any".to_string()).resolve(),
            Some(EVENT_TYPE_ANY)
        );
    }

    #[test]
    fn stub_runtime_parses() {
        let yaml = r#"
runtime:
  type: stub
projects: []
"#;
        let cfg: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.runtime.backend, RuntimeKind::Stub);
    }
}
