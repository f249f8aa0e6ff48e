//! XIV Chat Bridge
//!
//! Exposes the game client's chat over HTTP and types messages sent by HTTP
//! clients back into it. Built as a `cdylib` loaded by the host's plugin
//! loader (see [`ffi`]) and as an `rlib` for the development server and tests.

pub mod bridge;
pub mod chat;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod native;
pub mod web;

pub use bridge::{Bridge, BridgePaths, CONFIG_FILE_NAME};
pub use chat::{
    ChatFilter, ChatKind, ChatMessage, InjectionQueue, InputChannel, MessageArchive,
    MessageStore, NewMessageRequest, QueueFull,
};
pub use config::Config;
pub use dispatch::{process_pending, ChatDispatcher, TickContext};
pub use error::{BridgeError, Result};
pub use native::{GameFunctions, HookState, NativeError};
pub use web::{create_router, AppState, BridgeServer, ServerHandle};
