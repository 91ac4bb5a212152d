use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::GatewayError;
use crate::events::ActivityEvent;
use crate::ids::{AgentId, SessionId};

/// The three pipeline stages, each served by exactly one registered agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Drafting,
    Sending,
    Tracking,
}

impl AgentRole {
    pub const ALL: [AgentRole; 3] = [Self::Drafting, Self::Sending, Self::Tracking];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Drafting => "Outreach Coordinator",
            Self::Sending => "Email Sender",
            Self::Tracking => "Response Tracker",
        }
    }

    pub fn purpose(self) -> &'static str {
        match self {
            Self::Drafting => "Researches leads and drafts personalized email sequences",
            Self::Sending => "Sends approved emails and creates follow-up drafts",
            Self::Tracking => "Monitors email responses and classifies engagement status",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drafting => "drafting",
            Self::Sending => "sending",
            Self::Tracking => "tracking",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote identifiers of the three registered agents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDirectory {
    pub drafting: AgentId,
    pub sending: AgentId,
    pub tracking: AgentId,
}

impl AgentDirectory {
    pub fn agent_for(&self, role: AgentRole) -> &AgentId {
        match role {
            AgentRole::Drafting => &self.drafting,
            AgentRole::Sending => &self.sending,
            AgentRole::Tracking => &self.tracking,
        }
    }

    pub fn role_of(&self, agent: &AgentId) -> Option<AgentRole> {
        AgentRole::ALL.into_iter().find(|r| self.agent_for(*r) == agent)
    }
}

impl Default for AgentDirectory {
    fn default() -> Self {
        Self {
            drafting: AgentId::from_raw("outreach-coordinator"),
            sending: AgentId::from_raw("email-sender"),
            tracking: AgentId::from_raw("response-tracker"),
        }
    }
}

/// Result of one round trip to a remote agent.
///
/// `response` is opaque and untrusted; stage-specific interpretation (and
/// default substitution) happens in the orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub success: bool,
    pub session_id: Option<SessionId>,
    pub response: Option<Value>,
    pub error: Option<String>,
}

impl AgentReply {
    pub fn ok(response: Value) -> Self {
        Self {
            success: true,
            response: Some(response),
            ..Self::default()
        }
    }

    pub fn failed(error: Option<&str>) -> Self {
        Self {
            success: false,
            error: error.map(str::to_owned),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(SessionId::from_raw(session_id));
        self
    }

    /// Lenient decode of a reply envelope. Wrongly-typed fields are treated
    /// as absent; a missing or non-boolean `success` reads as `false`.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_owned)
        };
        Self {
            success: value.get("success").and_then(Value::as_bool).unwrap_or(false),
            session_id: text("session_id").map(SessionId::from_raw),
            response: value.get("response").filter(|v| !v.is_null()).cloned(),
            error: text("error"),
        }
    }
}

/// One request/response round trip to a named remote agent.
///
/// Implementations perform exactly one call per `invoke` and never retry.
/// `Err` is a thrown fault (transport, protocol); an explicit refusal by the
/// agent is `Ok` with `success == false`.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn invoke(&self, message: &str, agent_id: &AgentId) -> Result<AgentReply, GatewayError>;
}

pub type ActivityStream = Pin<Box<dyn Stream<Item = ActivityEvent> + Send>>;

/// Read-only subscription to a session's live progress feed.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a feed for `session_id`. The stream ends when the remote side
    /// closes; dropping it abandons the subscription without draining.
    async fn subscribe(&self, session_id: &SessionId) -> Result<ActivityStream, GatewayError>;
}
