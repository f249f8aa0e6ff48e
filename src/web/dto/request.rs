//! Request DTOs for the bridge HTTP API.

use serde::Deserialize;
use validator::Validate;

use super::validation::no_nul_bytes;
use crate::chat::{InputChannel, NewMessageRequest};

/// Maximum message length in characters.
pub const MAX_MESSAGE_CHARS: u64 = 500;

/// Body of `POST /messages`.
#[derive(Debug, Deserialize, Validate)]
pub struct NewMessageBody {
    /// Channel the message goes to.
    #[serde(rename = "type")]
    pub channel: InputChannel,
    /// Message text.
    #[validate(
        length(min = 1, max = 500, message = "must be between 1 and 500 characters"),
        custom(function = "no_nul_bytes")
    )]
    pub text: String,
}

impl From<NewMessageBody> for NewMessageRequest {
    fn from(body: NewMessageBody) -> Self {
        NewMessageRequest::new(body.channel, body.text)
    }
}
