//! Chat message types crossing the bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::channel::InputChannel;
use super::kind::ChatKind;

/// A chat line received from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Classification of the line.
    #[serde(rename = "type")]
    pub kind: ChatKind,
    /// Display name of the sender (empty for system lines).
    pub sender_name: String,
    /// Message body.
    pub text: String,
    /// When the line was received.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time.
    pub fn new(kind: ChatKind, sender_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_timestamp(kind, sender_name, text, Utc::now())
    }

    /// Create a message with an explicit timestamp.
    pub fn with_timestamp(
        kind: ChatKind,
        sender_name: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            sender_name: sender_name.into(),
            text: text.into(),
            timestamp,
        }
    }
}

/// A request to type a message into the host's chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessageRequest {
    /// Channel the message should go to.
    pub channel: InputChannel,
    /// Message body.
    pub text: String,
}

impl NewMessageRequest {
    /// Create a new outbound request.
    pub fn new(channel: InputChannel, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
        }
    }

    /// Whether the text already starts with a slash command.
    pub fn has_command_prefix(&self) -> bool {
        self.text.starts_with('/')
    }
}
