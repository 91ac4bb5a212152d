//! The outreach pipeline: drafting, sending, and response tracking driven
//! through the remote agents, with live progress folded per session.

pub mod aggregator;
pub mod coerce;
pub mod error;
pub mod orchestrator;
pub mod pending;
pub mod prompts;

pub use aggregator::{ActivitySnapshot, ProcessingGuard, SessionEventAggregator};
pub use error::EngineError;
pub use orchestrator::{DraftOutcome, OutreachOrchestrator, SendOutcome, TrackOutcome};
pub use pending::{InvocationRecord, PendingOperations, Scope, ScopeGuard};
