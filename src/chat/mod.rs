//! Chat data for the bridge.
//!
//! This module provides:
//! - Chat classifications and outbound channels with their host mapping
//! - The bounded store of received messages and its on-disk archive
//! - The queue of messages waiting to be typed into the host

mod archive;
mod channel;
mod filter;
mod kind;
mod message;
mod queue;
mod store;

pub use archive::{MessageArchive, ARCHIVE_FILE_NAME};
pub use channel::{InputChannel, UnknownChannel};
pub use filter::ChatFilter;
pub use kind::ChatKind;
pub use message::{ChatMessage, NewMessageRequest};
pub use queue::{InjectionQueue, QueueFull};
pub use store::MessageStore;
