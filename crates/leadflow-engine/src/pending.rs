//! Same-scope re-entrancy control.
//!
//! Drafting is serialized per lead; sending and tracking are each serialized
//! globally. Operations in different scopes never wait on one another.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use leadflow_core::{AgentId, AgentRole, InvocationId, LeadId};

use crate::error::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Scope {
    Draft { lead_id: LeadId },
    Send,
    Track,
}

impl Scope {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Draft { .. } => "Outreach generation for this lead",
            Self::Send => "Sending",
            Self::Track => "A response check",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft { lead_id } => write!(f, "draft:{lead_id}"),
            Self::Send => f.write_str("send"),
            Self::Track => f.write_str("track"),
        }
    }
}

/// State owned by one in-flight orchestrator call.
#[derive(Clone, Debug, Serialize)]
pub struct InvocationRecord {
    pub id: InvocationId,
    pub scope: Scope,
    pub stage: AgentRole,
    pub agent_id: AgentId,
    pub lead_id: Option<LeadId>,
    pub started_at: DateTime<Utc>,
}

/// Registry of busy scopes.
#[derive(Clone, Default)]
pub struct PendingOperations {
    busy: Arc<DashMap<Scope, InvocationRecord>>,
}

impl PendingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `scope` for the caller, or fail with [`EngineError::Busy`].
    pub fn acquire(
        &self,
        scope: Scope,
        stage: AgentRole,
        agent_id: AgentId,
        lead_id: Option<LeadId>,
    ) -> Result<ScopeGuard, EngineError> {
        match self.busy.entry(scope.clone()) {
            Entry::Occupied(_) => Err(EngineError::Busy { scope }),
            Entry::Vacant(slot) => {
                let record = InvocationRecord {
                    id: InvocationId::new(),
                    scope: scope.clone(),
                    stage,
                    agent_id,
                    lead_id,
                    started_at: Utc::now(),
                };
                let _ = slot.insert(record.clone());
                Ok(ScopeGuard {
                    busy: Arc::clone(&self.busy),
                    record,
                })
            }
        }
    }

    pub fn is_pending(&self, scope: &Scope) -> bool {
        self.busy.contains_key(scope)
    }

    /// Snapshot of every in-flight call, oldest first.
    pub fn list(&self) -> Vec<InvocationRecord> {
        let mut records: Vec<_> = self.busy.iter().map(|e| e.value().clone()).collect();
        records.sort_by_key(|r| r.started_at);
        records
    }
}

/// Releases its scope when dropped, whatever the call's outcome.
pub struct ScopeGuard {
    busy: Arc<DashMap<Scope, InvocationRecord>>,
    record: InvocationRecord,
}

impl ScopeGuard {
    pub fn record(&self) -> &InvocationRecord {
        &self.record
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let _ = self
            .busy
            .remove_if(&self.record.scope, |_, r| r.id == self.record.id);
    }
}
