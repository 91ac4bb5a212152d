//! Live progress for the most recently bound agent session.
//!
//! One session is followed at a time. Binding a new session id tears down the
//! previous subscription and starts from an empty read model; late events from
//! the old feed are discarded by generation check. The processing flag is
//! driven separately by the orchestrator and is not derived from the feed, so
//! the two can disagree while the feed lags.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use leadflow_core::{ActivityEvent, ActivityKind, AgentId, EventSource, SessionId};

/// Read model exposed to the presentation layer.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    pub session_id: Option<SessionId>,
    pub connected: bool,
    pub events: Vec<ActivityEvent>,
    pub thinking_events: Vec<ActivityEvent>,
    pub last_thinking_message: Option<String>,
    pub active_agent_id: Option<AgentId>,
    pub active_agent_name: Option<String>,
    pub is_processing: bool,
}

#[derive(Default)]
struct FeedState {
    generation: u64,
    session_id: Option<SessionId>,
    connected: bool,
    events: Vec<ActivityEvent>,
    thinking_events: Vec<ActivityEvent>,
    last_thinking_message: Option<String>,
    active_agent_id: Option<AgentId>,
    active_agent_name: Option<String>,
}

impl FeedState {
    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Fold one event. Returns `false` once the feed has been superseded.
    fn fold(&mut self, generation: u64, event: ActivityEvent) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        if self.session_id.as_ref() != Some(&event.session_id) {
            debug!(session_id = %event.session_id, "dropping event for another session");
            return true;
        }

        match event.kind {
            ActivityKind::AgentEnd => {
                let ended_other = matches!(
                    (&event.agent_id, &self.active_agent_id),
                    (Some(ended), Some(active)) if ended != active
                );
                if !ended_other {
                    self.active_agent_id = None;
                    self.active_agent_name = None;
                }
            }
            _ => {
                if let Some(agent_id) = &event.agent_id {
                    if self.active_agent_id.as_ref() != Some(agent_id) {
                        self.active_agent_name = None;
                    }
                    self.active_agent_id = Some(agent_id.clone());
                }
                if let Some(name) = &event.agent_name {
                    self.active_agent_name = Some(name.clone());
                }
            }
        }

        if event.is_thinking() {
            if !event.message.is_empty() {
                self.last_thinking_message = Some(event.message.clone());
            }
            self.thinking_events.push(event.clone());
        }
        self.events.push(event);
        true
    }
}

struct Subscription {
    session_id: SessionId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Folds a session's activity feed into an [`ActivitySnapshot`].
pub struct SessionEventAggregator {
    source: Arc<dyn EventSource>,
    state: Arc<RwLock<FeedState>>,
    subscription: Mutex<Option<Subscription>>,
    in_flight: Arc<AtomicUsize>,
}

impl SessionEventAggregator {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            state: Arc::new(RwLock::new(FeedState::default())),
            subscription: Mutex::new(None),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Follow `session_id`, superseding whatever was bound before.
    ///
    /// Must be called from within a tokio runtime. Rebinding the session that
    /// is already bound is a no-op and returns `false`.
    pub fn bind(&self, session_id: SessionId) -> bool {
        let mut subscription = self.subscription.lock();
        if subscription
            .as_ref()
            .is_some_and(|s| s.session_id == session_id)
        {
            return false;
        }
        if let Some(old) = subscription.take() {
            old.cancel.cancel();
            old.task.abort();
            debug!(session_id = %old.session_id, "activity feed superseded");
        }

        let generation = {
            let mut state = self.state.write();
            let generation = state.generation + 1;
            *state = FeedState {
                generation,
                session_id: Some(session_id.clone()),
                ..FeedState::default()
            };
            generation
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(follow(
            Arc::clone(&self.source),
            Arc::clone(&self.state),
            session_id.clone(),
            generation,
            cancel.clone(),
        ));
        info!(session_id = %session_id, generation, "activity feed bound");

        *subscription = Some(Subscription {
            session_id,
            cancel,
            task,
        });
        true
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.state.read().session_id.clone()
    }

    /// Mark one gateway call as in flight until the guard drops.
    pub fn begin_processing(&self) -> ProcessingGuard {
        let _ = self.in_flight.fetch_add(1, Ordering::SeqCst);
        ProcessingGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn snapshot(&self) -> ActivitySnapshot {
        let state = self.state.read();
        ActivitySnapshot {
            session_id: state.session_id.clone(),
            connected: state.connected,
            events: state.events.clone(),
            thinking_events: state.thinking_events.clone(),
            last_thinking_message: state.last_thinking_message.clone(),
            active_agent_id: state.active_agent_id.clone(),
            active_agent_name: state.active_agent_name.clone(),
            is_processing: self.is_processing(),
        }
    }
}

impl Drop for SessionEventAggregator {
    fn drop(&mut self) {
        if let Some(sub) = self.subscription.get_mut().take() {
            sub.cancel.cancel();
            sub.task.abort();
        }
    }
}

/// Clears one unit of the processing flag on drop.
pub struct ProcessingGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        let _ = self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn follow(
    source: Arc<dyn EventSource>,
    state: Arc<RwLock<FeedState>>,
    session_id: SessionId,
    generation: u64,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = source.subscribe(&session_id) => opened,
    };
    let mut feed = match opened {
        Ok(feed) => feed,
        Err(e) => {
            warn!(session_id = %session_id, error = %e, kind = e.error_kind(), "activity feed unavailable");
            return;
        }
    };

    {
        let mut st = state.write();
        if !st.is_current(generation) {
            return;
        }
        st.connected = true;
    }

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = feed.next() => match next {
                Some(event) => {
                    if !state.write().fold(generation, event) {
                        return;
                    }
                }
                None => {
                    let mut st = state.write();
                    if st.is_current(generation) {
                        st.connected = false;
                        debug!(session_id = %session_id, "activity feed closed");
                    }
                    return;
                }
            },
        }
    }
}
