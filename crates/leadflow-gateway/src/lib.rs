//! Transports behind the [`AgentGateway`](leadflow_core::AgentGateway) and
//! [`EventSource`](leadflow_core::EventSource) seams.
//!
//! - [`http::HttpAgentGateway`] posts one instruction per call to the agent
//!   service.
//! - [`sse::SseEventSource`] follows a session's progress feed over SSE.
//! - [`broadcast::BroadcastEventSource`] is an in-process feed, used when the
//!   progress events are produced locally and by tests.
//! - [`mock::MockGateway`] replays scripted replies.

pub mod broadcast;
pub mod http;
pub mod mock;
pub mod sse;

pub use broadcast::BroadcastEventSource;
pub use http::HttpAgentGateway;
pub use mock::{MockGateway, MockReply};
pub use sse::SseEventSource;
