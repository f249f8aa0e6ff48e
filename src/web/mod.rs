//! HTTP interface of the bridge.
//!
//! Serves the received chat log and accepts messages to send, plus the
//! static files of the companion UI.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::{BridgeServer, ServerHandle};
