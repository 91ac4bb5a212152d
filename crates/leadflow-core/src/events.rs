use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{AgentId, SessionId};

/// Classification of a progress event emitted by the remote agents while an
/// invocation runs. Only `Thinking` is singled out by the read model; the
/// remaining kinds are carried for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Thinking,
    AgentStart,
    AgentEnd,
    ToolCall,
    Progress,
    Error,
    Other,
}

impl ActivityKind {
    /// Lenient parse of the stream's free-form `type` tag.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['-', '.', ' '], "_").as_str() {
            "thinking" | "thinking_delta" | "reasoning" | "thought" => Self::Thinking,
            "agent_start" | "agent_started" | "start" => Self::AgentStart,
            "agent_end" | "agent_complete" | "agent_completed" | "end" | "done" => Self::AgentEnd,
            "tool_call" | "tool_start" | "tool_use" | "tool" => Self::ToolCall,
            "progress" | "status" | "update" | "info" => Self::Progress,
            "error" | "failure" => Self::Error,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::AgentStart => "agent_start",
            Self::AgentEnd => "agent_end",
            Self::ToolCall => "tool_call",
            Self::Progress => "progress",
            Self::Error => "error",
            Self::Other => "other",
        }
    }
}

/// One event of a session's live progress feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub session_id: SessionId,
    pub kind: ActivityKind,
    pub agent_id: Option<AgentId>,
    pub agent_name: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(session_id: SessionId, kind: ActivityKind, message: impl Into<String>) -> Self {
        Self {
            session_id,
            kind,
            agent_id: None,
            agent_name: None,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_agent(mut self, agent_id: AgentId, agent_name: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id);
        self.agent_name = Some(agent_name.into());
        self
    }

    pub fn is_thinking(&self) -> bool {
        self.kind == ActivityKind::Thinking
    }

    /// Build an event from an untrusted wire payload.
    ///
    /// The stream's schema is not under our control, so every field is
    /// optional: the session falls back to the subscribed one, the message to
    /// whichever text-ish field is present, and the timestamp to "now".
    /// Returns `None` only when the payload is not a JSON object.
    pub fn from_wire(value: &Value, subscribed: &SessionId) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .map(str::to_owned)
        };

        let kind = text(&["type", "event_type", "event"])
            .map(|t| ActivityKind::parse(&t))
            .unwrap_or(ActivityKind::Other);
        let session_id = text(&["session_id", "sessionId"])
            .filter(|s| !s.is_empty())
            .map(SessionId::from_raw)
            .unwrap_or_else(|| subscribed.clone());
        let timestamp = text(&["timestamp", "ts"])
            .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Some(Self {
            session_id,
            kind,
            agent_id: text(&["agent_id", "agentId"])
                .filter(|s| !s.is_empty())
                .map(AgentId::from_raw),
            agent_name: text(&["agent_name", "agentName"]).filter(|s| !s.is_empty()),
            message: text(&["message", "content", "text", "thinking"]).unwrap_or_default(),
            timestamp,
        })
    }
}
