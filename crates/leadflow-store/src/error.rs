use leadflow_core::LeadStatus;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: LeadStatus, to: LeadStatus },

    #[error("validation error: {0}")]
    Validation(String),
}

impl StoreError {
    pub(crate) fn lead_not_found(id: &leadflow_core::LeadId) -> Self {
        Self::NotFound(format!("lead {id}"))
    }
}
