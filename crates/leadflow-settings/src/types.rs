use std::time::Duration;

use leadflow_core::AgentDirectory;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{Result, SettingsError};

/// Voice the drafting agent should write in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Consultative,
}

pub const FOLLOW_UP_1_RANGE: (u32, u32) = (1, 30);
pub const FOLLOW_UP_2_RANGE: (u32, u32) = (1, 60);

/// Operator preferences for outreach.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub signature: String,
    pub tone: Tone,
    pub sender_name: String,
    pub follow_up1_days: u32,
    pub follow_up2_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            signature: String::new(),
            tone: Tone::Professional,
            sender_name: String::new(),
            follow_up1_days: 3,
            follow_up2_days: 7,
        }
    }
}

impl Settings {
    /// Reject cadences outside the editable ranges.
    pub fn validate(&self) -> Result<()> {
        check_range("followUp1Days", self.follow_up1_days, FOLLOW_UP_1_RANGE)?;
        check_range("followUp2Days", self.follow_up2_days, FOLLOW_UP_2_RANGE)
    }

    /// Replace out-of-range cadences with their defaults.
    pub fn clamped(mut self) -> Self {
        let defaults = Self::default();
        if !in_range(self.follow_up1_days, FOLLOW_UP_1_RANGE) {
            self.follow_up1_days = defaults.follow_up1_days;
        }
        if !in_range(self.follow_up2_days, FOLLOW_UP_2_RANGE) {
            self.follow_up2_days = defaults.follow_up2_days;
        }
        self
    }
}

fn in_range(value: u32, (min, max): (u32, u32)) -> bool {
    (min..=max).contains(&value)
}

fn check_range(name: &str, value: u32, range: (u32, u32)) -> Result<()> {
    if in_range(value, range) {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue(format!(
            "{name} must be between {} and {}, got {value}",
            range.0, range.1
        )))
    }
}

/// Secret API key for the agent gateway. Redacted in Debug, never serialized.
#[derive(Clone)]
pub struct ApiKey(pub SecretString);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

impl<'de> Deserialize<'de> for ApiKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self(SecretString::from(raw)))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9092,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewaySettings {
    /// Endpoint receiving `{message, agent_id}` invocations.
    pub base_url: String,
    /// Base of the per-session progress feed (`{events_url}/{session_id}`).
    pub events_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<ApiKey>,
    pub connect_timeout_ms: u64,
    /// Whole-request ceiling for the HTTP client. `None` waits indefinitely.
    pub request_timeout_ms: Option<u64>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/agent".to_string(),
            events_url: "http://127.0.0.1:8000/api/events".to_string(),
            api_key: None,
            connect_timeout_ms: 30_000,
            request_timeout_ms: None,
        }
    }
}

impl GatewaySettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Service wiring.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    pub server: ServerSettings,
    pub gateway: GatewaySettings,
    pub agents: AgentDirectory,
}
