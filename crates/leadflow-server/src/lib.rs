pub mod handlers;
pub mod response;
pub mod server;

pub use response::{ActionResponse, ApiError, ResultKind};
pub use server::{build_router, start, AppState, ServerHandle};
