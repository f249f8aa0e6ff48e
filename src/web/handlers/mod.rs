//! API handlers for the bridge HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use crate::chat::{InjectionQueue, MessageStore};

pub mod assets;
pub mod messages;

pub use assets::*;
pub use messages::*;

/// Application state shared across handlers.
///
/// Handlers only read the store and enqueue requests; nothing here reaches
/// into the host process.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Received chat messages.
    pub store: Arc<MessageStore>,
    /// Messages waiting to be typed into the host.
    pub queue: Arc<InjectionQueue>,
    /// Root of the companion UI files.
    pub assets_dir: PathBuf,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        store: Arc<MessageStore>,
        queue: Arc<InjectionQueue>,
        assets_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            queue,
            assets_dir: assets_dir.into(),
        }
    }
}
