use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use leadflow_core::{AgentGateway, AgentId, AgentReply, GatewayError};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

/// Pre-programmed replies for deterministic testing without a remote service.
#[derive(Clone)]
pub enum MockReply {
    /// Return this reply envelope.
    Reply(AgentReply),
    /// Fail the call itself.
    Error(GatewayError),
    /// Wait a duration, then resolve the inner reply.
    Delay(Duration, Box<MockReply>),
    /// Wait until the gate is notified, then resolve the inner reply.
    Held(Arc<Notify>, Box<MockReply>),
}

impl MockReply {
    /// `success: true` carrying `response`.
    pub fn success(response: Value) -> Self {
        Self::Reply(AgentReply::ok(response))
    }

    /// `success: true` with a session id for the activity feed.
    pub fn success_in_session(session_id: &str, response: Value) -> Self {
        Self::Reply(AgentReply::ok(response).with_session(session_id))
    }

    /// `success: false`, optionally with error text.
    pub fn refused(error: Option<&str>) -> Self {
        Self::Reply(AgentReply::failed(error))
    }

    pub fn delayed(delay: Duration, inner: MockReply) -> Self {
        Self::Delay(delay, Box::new(inner))
    }

    pub fn held(gate: Arc<Notify>, inner: MockReply) -> Self {
        Self::Held(gate, Box::new(inner))
    }
}

/// One recorded invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub message: String,
    pub agent_id: AgentId,
}

/// Gateway that returns pre-programmed replies in sequence and records every
/// call it receives. Calls past the end of the script fail.
pub struct MockGateway {
    replies: Vec<MockReply>,
    call_count: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGateway {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies,
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AgentGateway for MockGateway {
    async fn invoke(&self, message: &str, agent_id: &AgentId) -> Result<AgentReply, GatewayError> {
        self.calls.lock().push(RecordedCall {
            message: message.to_string(),
            agent_id: agent_id.clone(),
        });
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);

        let Some(reply) = self.replies.get(idx).cloned() else {
            return Err(GatewayError::InvalidRequest(format!(
                "MockGateway: no reply configured for call {idx}"
            )));
        };
        resolve_reply(reply).await
    }
}

/// Unrolls nested waits iteratively to avoid recursive async.
async fn resolve_reply(reply: MockReply) -> Result<AgentReply, GatewayError> {
    let mut current = reply;
    loop {
        match current {
            MockReply::Reply(reply) => return Ok(reply),
            MockReply::Error(e) => return Err(e),
            MockReply::Delay(duration, inner) => {
                tokio::time::sleep(duration).await;
                current = *inner;
            }
            MockReply::Held(gate, inner) => {
                gate.notified().await;
                current = *inner;
            }
        }
    }
}
