use leadflow_core::{AgentRole, LeadStatus};
use leadflow_store::StoreError;

use crate::pending::Scope;

pub const NO_ELIGIBLE_TARGETS: &str =
    "No outreach has been sent yet. Send emails first before checking responses.";

/// Message surfaced when the agent declines without saying why.
pub fn default_failure_message(stage: AgentRole) -> &'static str {
    match stage {
        AgentRole::Drafting => "Failed to generate outreach. Please try again.",
        AgentRole::Sending => "Failed to send email. Please try again.",
        AgentRole::Tracking => "Failed to check responses. Please try again.",
    }
}

/// Message surfaced when the round trip itself fails.
pub fn unexpected_failure_message(stage: AgentRole) -> &'static str {
    match stage {
        AgentRole::Drafting => "An unexpected error occurred while generating outreach.",
        AgentRole::Sending => "An unexpected error occurred while sending the email.",
        AgentRole::Tracking => "An unexpected error occurred while checking responses.",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The agent refused (`success: false`) or the round trip failed.
    #[error("{stage} failed: {message}")]
    GatewayFailure { stage: AgentRole, message: String },

    #[error("no eligible targets")]
    NoEligibleTargets,

    #[error("busy: {scope}")]
    Busy { scope: Scope },

    #[error("lead not found: {0}")]
    LeadNotFound(String),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: LeadStatus, to: LeadStatus },

    #[error("validation error: {0}")]
    Validation(String),
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::LeadNotFound(what),
            StoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            StoreError::Validation(msg) => Self::Validation(msg),
        }
    }
}

impl EngineError {
    /// The single line shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::GatewayFailure { message, .. } => message.clone(),
            Self::NoEligibleTargets => NO_ELIGIBLE_TARGETS.to_string(),
            Self::Busy { scope } => format!("{} is already in progress.", scope.describe()),
            Self::LeadNotFound(_) => "Lead not found.".to_string(),
            Self::InvalidTransition { from, to } => {
                format!("A lead in \"{from}\" cannot move to \"{to}\".")
            }
            Self::Validation(msg) => msg.clone(),
        }
    }

    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::GatewayFailure { .. } => "gateway_failure",
            Self::NoEligibleTargets => "no_eligible_targets",
            Self::Busy { .. } => "busy",
            Self::LeadNotFound(_) => "lead_not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Validation(_) => "validation",
        }
    }
}
