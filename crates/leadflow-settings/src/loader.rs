//! Loading and saving with deep merge and environment variable overrides.
//!
//! Merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use leadflow_core::AgentId;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::types::{ApiKey, ServiceConfig, Settings};

fn leadflow_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".leadflow")
}

/// `~/.leadflow/settings.json`
pub fn settings_path() -> PathBuf {
    leadflow_dir().join("settings.json")
}

/// `~/.leadflow/config.json`
pub fn config_path() -> PathBuf {
    leadflow_dir().join("config.json")
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

fn load_merged<T: Default + Serialize + DeserializeOwned>(path: &Path) -> Result<T> {
    let defaults = serde_json::to_value(T::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Read the operator's preferences. A missing file yields defaults; invalid
/// JSON is an error. Out-of-range cadences fall back to their defaults.
pub fn load_settings_from_path(path: &Path) -> Result<Settings> {
    let settings: Settings = load_merged(path)?;
    Ok(settings.clamped())
}

/// Persist the operator's preferences after validating them.
pub fn save_settings_to_path(path: &Path, settings: &Settings) -> Result<()> {
    settings.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    info!(?path, "settings saved");
    Ok(())
}

/// Load service wiring from the default path with env var overrides.
pub fn load_config() -> Result<ServiceConfig> {
    load_config_from_path(&config_path())
}

pub fn load_config_from_path(path: &Path) -> Result<ServiceConfig> {
    let mut config: ServiceConfig = load_merged(path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply `LEADFLOW_*` overrides. Invalid values are ignored with a warning.
pub fn apply_env_overrides(config: &mut ServiceConfig) {
    if let Some(v) = read_env_string("LEADFLOW_HOST") {
        config.server.host = v;
    }
    if let Some(v) = read_env("LEADFLOW_PORT", |s| parse_u16_range(s, 1, 65535)) {
        config.server.port = v;
    }
    if let Some(v) = read_env_string("LEADFLOW_GATEWAY_URL") {
        config.gateway.base_url = v;
    }
    if let Some(v) = read_env_string("LEADFLOW_EVENTS_URL") {
        config.gateway.events_url = v;
    }
    if let Some(v) = read_env_string("LEADFLOW_API_KEY") {
        config.gateway.api_key = Some(ApiKey(SecretString::from(v)));
    }
    if let Some(v) = read_env("LEADFLOW_CONNECT_TIMEOUT_MS", |s| {
        parse_u64_range(s, 100, 600_000)
    }) {
        config.gateway.connect_timeout_ms = v;
    }
    if let Some(v) = read_env("LEADFLOW_REQUEST_TIMEOUT_MS", |s| {
        parse_u64_range(s, 100, 3_600_000)
    }) {
        config.gateway.request_timeout_ms = Some(v);
    }
    if let Some(v) = read_env_string("LEADFLOW_DRAFTING_AGENT") {
        config.agents.drafting = AgentId::from_raw(v);
    }
    if let Some(v) = read_env_string("LEADFLOW_SENDING_AGENT") {
        config.agents.sending = AgentId::from_raw(v);
    }
    if let Some(v) = read_env_string("LEADFLOW_TRACKING_AGENT") {
        config.agents.tracking = AgentId::from_raw(v);
    }
}

pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn read_env<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let val = std::env::var(name).ok()?;
    let result = parse(&val);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid env var, ignoring");
    }
    result
}
