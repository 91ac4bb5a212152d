pub mod errors;
pub mod events;
pub mod gateway;
pub mod ids;
pub mod lead;
pub mod outreach;
pub mod status;
pub mod tracking;

pub use errors::GatewayError;
pub use events::{ActivityEvent, ActivityKind};
pub use gateway::{ActivityStream, AgentDirectory, AgentGateway, AgentReply, AgentRole, EventSource};
pub use ids::{AgentId, InvocationId, LeadId, SessionId};
pub use lead::{Lead, LeadStatus, NewLead};
pub use outreach::{EmailDraft, FollowUp, OutreachData, PersonalizationBrief};
pub use status::resolve_status;
pub use tracking::{EngagementMetrics, TrackedLead, TrackingReport};
