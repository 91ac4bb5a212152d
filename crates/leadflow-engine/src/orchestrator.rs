//! The three pipeline stages.
//!
//! Each stage builds an instruction, makes exactly one gateway round trip,
//! coerces the reply, and on success applies it to the store in one step.
//! Any reply that names a session binds it to the activity feed, refusals
//! included. Failures leave the store untouched.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use leadflow_core::{
    AgentDirectory, AgentGateway, AgentReply, AgentRole, EmailDraft, FollowUp, Lead, LeadId,
    LeadStatus, NewLead, TrackingReport,
};
use leadflow_store::{LeadStore, TrackingUpdate};

use crate::aggregator::{ActivitySnapshot, SessionEventAggregator};
use crate::coerce::{self, SendReceipt};
use crate::error::{default_failure_message, unexpected_failure_message, EngineError};
use crate::pending::{InvocationRecord, PendingOperations, Scope};
use crate::prompts;

#[derive(Clone, Debug, Serialize)]
pub struct DraftOutcome {
    pub lead: Lead,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SendOutcome {
    pub lead: Lead,
    pub recipient: String,
    pub follow_up_drafts: usize,
    pub summary: String,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TrackOutcome {
    pub report: TrackingReport,
    #[serde(skip)]
    pub updates: Vec<TrackingUpdate>,
    pub message: String,
}

pub struct OutreachOrchestrator {
    gateway: Arc<dyn AgentGateway>,
    store: LeadStore,
    activity: Arc<SessionEventAggregator>,
    agents: AgentDirectory,
    pending: PendingOperations,
}

impl OutreachOrchestrator {
    pub fn new(
        gateway: Arc<dyn AgentGateway>,
        store: LeadStore,
        activity: Arc<SessionEventAggregator>,
        agents: AgentDirectory,
    ) -> Self {
        Self {
            gateway,
            store,
            activity,
            agents,
            pending: PendingOperations::new(),
        }
    }

    pub fn store(&self) -> &LeadStore {
        &self.store
    }

    pub fn agents(&self) -> &AgentDirectory {
        &self.agents
    }

    // ── Leads ────────────────────────────────────────────────────────

    pub fn add_lead(&self, input: NewLead) -> Result<Lead, EngineError> {
        Ok(self.store.add(input)?)
    }

    pub fn remove_lead(&self, id: &LeadId) -> Result<Lead, EngineError> {
        Ok(self.store.remove(id)?)
    }

    pub fn get_lead(&self, id: &LeadId) -> Result<Lead, EngineError> {
        Ok(self.store.get(id)?)
    }

    pub fn list_leads(&self) -> Vec<Lead> {
        self.store.list()
    }

    pub fn edit_draft(
        &self,
        id: &LeadId,
        initial_email: EmailDraft,
        follow_ups: Vec<FollowUp>,
    ) -> Result<Lead, EngineError> {
        Ok(self.store.edit_draft(id, initial_email, follow_ups)?)
    }

    // ── Read models ──────────────────────────────────────────────────

    pub fn tracking_report(&self) -> TrackingReport {
        self.store.tracking_report()
    }

    pub fn activity(&self) -> ActivitySnapshot {
        self.activity.snapshot()
    }

    pub fn pending(&self) -> Vec<InvocationRecord> {
        self.pending.list()
    }

    pub fn is_pending(&self, scope: &Scope) -> bool {
        self.pending.is_pending(scope)
    }

    // ── Pipeline ─────────────────────────────────────────────────────

    /// Research and draft outreach for a lead, replacing any earlier draft.
    #[instrument(skip_all, fields(lead_id = %lead_id))]
    pub async fn generate_outreach(&self, lead_id: &LeadId) -> Result<DraftOutcome, EngineError> {
        let lead = self.store.get(lead_id)?;
        ensure_transition(lead.status, LeadStatus::DraftReady)?;

        let stage = AgentRole::Drafting;
        let _guard = self.pending.acquire(
            Scope::Draft {
                lead_id: lead_id.clone(),
            },
            stage,
            self.agents.agent_for(stage).clone(),
            Some(lead_id.clone()),
        )?;

        let reply = self.invoke(stage, &prompts::draft_instruction(&lead)).await?;
        let data = coerce::coerce_outreach(coerce::payload(reply.response.as_ref()));
        let lead = self.store.apply_draft(lead_id, data)?;

        Ok(DraftOutcome {
            message: format!("Outreach generated for {}. Review the draft below.", lead.name),
            lead,
        })
    }

    /// Send the initial email and have follow-up drafts created.
    ///
    /// `initial_email` and `follow_ups` override the stored draft when given;
    /// the copy actually sent is what gets stored.
    #[instrument(skip_all, fields(lead_id = %lead_id))]
    pub async fn send_email(
        &self,
        lead_id: &LeadId,
        initial_email: Option<EmailDraft>,
        follow_ups: Option<Vec<FollowUp>>,
    ) -> Result<SendOutcome, EngineError> {
        let lead = self.store.get(lead_id)?;
        if lead.status != LeadStatus::DraftReady {
            return Err(EngineError::InvalidTransition {
                from: lead.status,
                to: LeadStatus::OutreachSent,
            });
        }

        let stored = lead.outreach_data.clone().unwrap_or_default();
        let email = initial_email.unwrap_or(stored.initial_email);
        let mut follow_ups = follow_ups.unwrap_or(stored.follow_ups);
        if !email.is_sendable() {
            return Err(EngineError::Validation(
                "Subject and body are required before sending.".into(),
            ));
        }
        if let Some(fu) = follow_ups.iter().find(|f| f.send_after_days < 1) {
            return Err(EngineError::Validation(format!(
                "Follow-up {} must be sent at least 1 day after the initial email.",
                fu.sequence_number
            )));
        }
        follow_ups.sort_by_key(|f| f.sequence_number);

        let stage = AgentRole::Sending;
        let _guard = self.pending.acquire(
            Scope::Send,
            stage,
            self.agents.agent_for(stage).clone(),
            Some(lead_id.clone()),
        )?;

        let instruction = prompts::send_instruction(&lead.email, &email, &follow_ups);
        let reply = self.invoke(stage, &instruction).await?;
        let receipt = coerce::coerce_send(coerce::payload(reply.response.as_ref()));
        let lead = self.store.mark_sent(lead_id, email, follow_ups)?;

        let recipient = if receipt.recipient.is_empty() {
            lead.email.clone()
        } else {
            receipt.recipient.clone()
        };
        Ok(SendOutcome {
            message: send_message(&recipient, &receipt),
            recipient,
            follow_up_drafts: receipt.follow_up_drafts,
            summary: receipt.summary,
            lead,
        })
    }

    /// Ask the tracker about every lead whose outreach has gone out.
    #[instrument(skip(self))]
    pub async fn check_responses(&self) -> Result<TrackOutcome, EngineError> {
        let targets = self.store.sent_leads();
        if targets.is_empty() {
            return Err(EngineError::NoEligibleTargets);
        }

        let stage = AgentRole::Tracking;
        let _guard = self.pending.acquire(
            Scope::Track,
            stage,
            self.agents.agent_for(stage).clone(),
            None,
        )?;

        let reply = self
            .invoke(stage, &prompts::track_instruction(&targets))
            .await?;
        let result = coerce::coerce_tracking(coerce::payload(reply.response.as_ref()));
        let report = TrackingReport {
            tracked_leads: result.tracked_leads,
            metrics: result.metrics,
            overall_summary: result.overall_summary,
            checked_at: Some(Utc::now()),
        };
        let updates = self.store.apply_tracking(report.clone());

        Ok(TrackOutcome {
            message: format!("Checked responses for {} lead(s).", report.tracked_leads.len()),
            report,
            updates,
        })
    }

    /// One round trip, with the processing flag raised for its duration.
    /// A session named by the reply is bound before its outcome is checked.
    /// Refusals and faults both come back as [`EngineError::GatewayFailure`].
    async fn invoke(&self, stage: AgentRole, instruction: &str) -> Result<AgentReply, EngineError> {
        let agent_id = self.agents.agent_for(stage);
        let started = Instant::now();
        let _processing = self.activity.begin_processing();

        let result = self.gateway.invoke(instruction, agent_id).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if let Ok(reply) = &result {
            self.bind_session(reply);
        }

        match result {
            Ok(reply) if reply.success => {
                info!(stage = %stage, agent_id = %agent_id, elapsed_ms, "agent succeeded");
                Ok(reply)
            }
            Ok(reply) => {
                let message = reply
                    .error
                    .clone()
                    .unwrap_or_else(|| default_failure_message(stage).to_string());
                warn!(stage = %stage, agent_id = %agent_id, elapsed_ms, error = %message, "agent refused");
                Err(EngineError::GatewayFailure { stage, message })
            }
            Err(e) => {
                warn!(
                    stage = %stage,
                    agent_id = %agent_id,
                    elapsed_ms,
                    error = %e,
                    kind = e.error_kind(),
                    "agent call failed"
                );
                Err(EngineError::GatewayFailure {
                    stage,
                    message: unexpected_failure_message(stage).to_string(),
                })
            }
        }
    }

    fn bind_session(&self, reply: &AgentReply) {
        if let Some(session_id) = &reply.session_id {
            let _ = self.activity.bind(session_id.clone());
        }
    }
}

fn ensure_transition(from: LeadStatus, to: LeadStatus) -> Result<(), EngineError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(EngineError::InvalidTransition { from, to })
    }
}

fn send_message(recipient: &str, receipt: &SendReceipt) -> String {
    let mut parts = vec![format!("Email sent to {recipient}.")];
    if receipt.follow_up_drafts > 0 {
        parts.push(format!("{} follow-up draft(s) created.", receipt.follow_up_drafts));
    }
    if !receipt.summary.is_empty() {
        parts.push(receipt.summary.clone());
    }
    parts.join(" ")
}
