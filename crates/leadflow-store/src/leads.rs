use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use leadflow_core::{
    EmailDraft, FollowUp, Lead, LeadId, LeadStatus, NewLead, OutreachData, TrackingReport,
};

use crate::error::StoreError;

#[derive(Default)]
struct State {
    /// Most recently added first.
    leads: Vec<Lead>,
    report: TrackingReport,
}

/// A lead whose status was changed by a tracking check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackingUpdate {
    pub lead_id: LeadId,
    pub from: LeadStatus,
    pub to: LeadStatus,
}

/// In-memory lead registry. Cloning yields another handle to the same data.
///
/// Every mutation takes the write lock once and either applies completely or
/// returns an error with the record untouched.
#[derive(Clone, Default)]
pub struct LeadStore {
    inner: Arc<RwLock<State>>,
}

impl LeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing records, listed in the given order.
    pub fn with_snapshot(leads: Vec<Lead>, report: TrackingReport) -> Self {
        Self {
            inner: Arc::new(RwLock::new(State { leads, report })),
        }
    }

    /// Register a new lead. Name and email are required.
    #[instrument(skip_all, fields(email = %input.email))]
    pub fn add(&self, mut input: NewLead) -> Result<Lead, StoreError> {
        input.name = input.name.trim().to_string();
        input.email = input.email.trim().to_string();
        if input.name.is_empty() {
            return Err(StoreError::Validation("name is required".into()));
        }
        if input.email.is_empty() {
            return Err(StoreError::Validation("email is required".into()));
        }

        let lead = Lead::new(input);
        self.inner.write().leads.insert(0, lead.clone());
        info!(lead_id = %lead.id, "lead added");
        Ok(lead)
    }

    pub fn get(&self, id: &LeadId) -> Result<Lead, StoreError> {
        self.inner
            .read()
            .leads
            .iter()
            .find(|l| &l.id == id)
            .cloned()
            .ok_or_else(|| StoreError::lead_not_found(id))
    }

    pub fn list(&self) -> Vec<Lead> {
        self.inner.read().leads.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remove(&self, id: &LeadId) -> Result<Lead, StoreError> {
        let mut state = self.inner.write();
        let idx = state
            .leads
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| StoreError::lead_not_found(id))?;
        let lead = state.leads.remove(idx);
        info!(lead_id = %id, "lead removed");
        Ok(lead)
    }

    /// Leads whose outreach has gone out, in listing order.
    pub fn sent_leads(&self) -> Vec<Lead> {
        self.inner
            .read()
            .leads
            .iter()
            .filter(|l| l.status.is_sent())
            .cloned()
            .collect()
    }

    /// Replace the lead's outreach wholesale and move it to `DraftReady`.
    #[instrument(skip(self, data), fields(lead_id = %id))]
    pub fn apply_draft(&self, id: &LeadId, data: OutreachData) -> Result<Lead, StoreError> {
        self.update(id, |lead| {
            check_transition(lead.status, LeadStatus::DraftReady)?;
            lead.outreach_data = Some(data);
            lead.status = LeadStatus::DraftReady;
            Ok(())
        })
    }

    /// Replace the editable parts of a ready draft. Status is unchanged.
    #[instrument(skip(self, initial_email, follow_ups), fields(lead_id = %id))]
    pub fn edit_draft(
        &self,
        id: &LeadId,
        initial_email: EmailDraft,
        mut follow_ups: Vec<FollowUp>,
    ) -> Result<Lead, StoreError> {
        validate_follow_ups(&follow_ups)?;
        follow_ups.sort_by_key(|f| f.sequence_number);

        self.update(id, |lead| {
            if lead.status != LeadStatus::DraftReady {
                return Err(StoreError::Validation(format!(
                    "only drafts can be edited; lead is {}",
                    lead.status
                )));
            }
            let data = lead.outreach_data.get_or_insert_with(OutreachData::default);
            data.initial_email = initial_email;
            data.follow_ups = follow_ups;
            Ok(())
        })
    }

    /// Record that the initial email went out, keeping the copy that was sent.
    #[instrument(skip(self, initial_email, follow_ups), fields(lead_id = %id))]
    pub fn mark_sent(
        &self,
        id: &LeadId,
        initial_email: EmailDraft,
        mut follow_ups: Vec<FollowUp>,
    ) -> Result<Lead, StoreError> {
        follow_ups.sort_by_key(|f| f.sequence_number);
        self.update(id, |lead| {
            check_transition(lead.status, LeadStatus::OutreachSent)?;
            let data = lead.outreach_data.get_or_insert_with(OutreachData::default);
            data.initial_email = initial_email;
            data.follow_ups = follow_ups;
            lead.status = LeadStatus::OutreachSent;
            Ok(())
        })
    }

    /// Apply a tracking check: resolve each record's classification, move
    /// every sent lead with a matching email, and replace the stored report.
    ///
    /// Unrecognised classifications leave matching leads untouched.
    #[instrument(skip_all, fields(tracked = report.tracked_leads.len()))]
    pub fn apply_tracking(&self, report: TrackingReport) -> Vec<TrackingUpdate> {
        let mut state = self.inner.write();
        let mut updates = Vec::new();

        for record in &report.tracked_leads {
            let resolved = record.resolved_status();
            if resolved == LeadStatus::OutreachSent {
                debug!(email = %record.email, raw = %record.status, "unrecognised classification");
                continue;
            }
            for lead in state
                .leads
                .iter_mut()
                .filter(|l| l.status.is_sent() && l.email_matches(&record.email))
            {
                if !lead.status.can_transition_to(resolved) {
                    continue;
                }
                updates.push(TrackingUpdate {
                    lead_id: lead.id.clone(),
                    from: lead.status,
                    to: resolved,
                });
                lead.status = resolved;
                lead.touch();
            }
        }

        state.report = report;
        info!(updated = updates.len(), "tracking applied");
        updates
    }

    pub fn tracking_report(&self) -> TrackingReport {
        self.inner.read().report.clone()
    }

    fn update(
        &self,
        id: &LeadId,
        apply: impl FnOnce(&mut Lead) -> Result<(), StoreError>,
    ) -> Result<Lead, StoreError> {
        let mut state = self.inner.write();
        let lead = state
            .leads
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| StoreError::lead_not_found(id))?;

        let mut draft = lead.clone();
        apply(&mut draft)?;
        draft.touch();
        *lead = draft.clone();
        Ok(draft)
    }
}

fn check_transition(from: LeadStatus, to: LeadStatus) -> Result<(), StoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(StoreError::InvalidTransition { from, to })
    }
}

fn validate_follow_ups(follow_ups: &[FollowUp]) -> Result<(), StoreError> {
    match follow_ups.iter().find(|f| f.send_after_days < 1) {
        Some(f) => Err(StoreError::Validation(format!(
            "follow-up {} must be sent at least 1 day after the initial email",
            f.sequence_number
        ))),
        None => Ok(()),
    }
}
