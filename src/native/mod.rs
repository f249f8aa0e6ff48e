//! Interop with the host process.
//!
//! This module provides:
//! - Byte-pattern signatures and scanning of the host module's code section
//! - Detours on host functions with access to the original implementation
//! - Fixed-layout payloads passed to host functions
//! - The chat injector and channel switcher built on top of them
//!
//! All raw pointer work lives here. Everything outside this module talks to
//! the host through [`GameFunctions`] and the [`crate::dispatch::ChatDispatcher`]
//! trait.

mod functions;
mod hooks;
mod image;
mod interceptor;
mod payload;
mod signature;

use thiserror::Error;

pub use functions::{
    compose_text, ChannelChangeInvoker, ChannelSwitchFn, ChatInjector, GameFunctions,
    ProcessChatFn, SIGNATURES,
};
pub use hooks::{HookState, InputSource};
pub use image::{find_text_section, ModuleText, SectionSpan};
pub use interceptor::{Detour, Hook};
pub use payload::{
    ChatPayload, NativeString, ScratchText, CHAT_PAYLOAD_SIZE, NATIVE_STRING_SIZE,
    PAYLOAD_BLOCK_SIZE,
};
pub use signature::Signature;

/// Errors raised while locating or hooking host functions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    /// A signature string could not be parsed.
    #[error("invalid signature pattern: {0}")]
    InvalidPattern(String),

    /// The module image headers could not be read.
    #[error("invalid module image: {0}")]
    InvalidImage(String),

    /// A signature matched nowhere in the code section.
    #[error("signature not found: {0}")]
    PatternNotFound(&'static str),

    /// Installing or toggling a detour failed.
    #[error("hook error: {0}")]
    Hook(String),

    /// Detours are not available on this platform.
    #[error("native hooks are not supported on this platform")]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            NativeError::PatternNotFound("ProcessChat").to_string(),
            "signature not found: ProcessChat"
        );
        assert_eq!(
            NativeError::InvalidPattern("ZZ".to_string()).to_string(),
            "invalid signature pattern: ZZ"
        );
    }
}
