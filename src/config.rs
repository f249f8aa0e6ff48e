//! Configuration module for the chat bridge.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use crate::chat::ChatKind;
use crate::{BridgeError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen on all interfaces instead of loop-back only.
    #[serde(default)]
    pub allow_non_local_access: bool,
    /// Origins granted cross-origin access. Empty means none.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    9876
}

impl ServerConfig {
    /// Socket address the listener binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        let ip = if self.allow_non_local_access {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };
        SocketAddr::new(ip, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            allow_non_local_access: false,
            cors_origins: Vec::new(),
        }
    }
}

/// Message store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Maximum number of chat messages kept in memory.
    #[serde(default = "default_message_limit")]
    pub limit: usize,
    /// Persist messages across plugin restarts.
    #[serde(default = "default_persist")]
    pub persist: bool,
    /// Maximum number of outbound messages waiting for injection.
    #[serde(default = "default_pending_limit")]
    pub pending_limit: usize,
}

/// Upper bound applied to `messages.limit`.
pub const MAX_MESSAGE_LIMIT: usize = 100_000;

fn default_message_limit() -> usize {
    5000
}

fn default_persist() -> bool {
    true
}

fn default_pending_limit() -> usize {
    256
}

impl MessagesConfig {
    /// Store capacity, clamped to `1..=MAX_MESSAGE_LIMIT`.
    pub fn capacity(&self) -> usize {
        if self.limit > MAX_MESSAGE_LIMIT {
            tracing::warn!(
                "messages.limit {} exceeds {}, clamping",
                self.limit,
                MAX_MESSAGE_LIMIT
            );
        }
        self.limit.clamp(1, MAX_MESSAGE_LIMIT)
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            limit: default_message_limit(),
            persist: default_persist(),
            pending_limit: default_pending_limit(),
        }
    }
}

/// Chat capture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Chat classifications that are recorded.
    #[serde(default = "default_enabled_types")]
    pub enabled_types: Vec<ChatKind>,
}

fn default_enabled_types() -> Vec<ChatKind> {
    vec![
        ChatKind::Say,
        ChatKind::TellIncoming,
        ChatKind::TellOutgoing,
        ChatKind::FreeCompany,
        ChatKind::Party,
        ChatKind::CrossParty,
        ChatKind::Alliance,
        ChatKind::Yell,
        ChatKind::Shout,
        ChatKind::Ls1,
        ChatKind::Ls2,
        ChatKind::Ls3,
        ChatKind::Ls4,
        ChatKind::Ls5,
        ChatKind::Ls6,
        ChatKind::Ls7,
        ChatKind::Ls8,
        ChatKind::CrossLinkShell1,
        ChatKind::CrossLinkShell2,
        ChatKind::CrossLinkShell3,
        ChatKind::CrossLinkShell4,
        ChatKind::CrossLinkShell5,
        ChatKind::CrossLinkShell6,
        ChatKind::CrossLinkShell7,
        ChatKind::CrossLinkShell8,
    ]
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled_types: default_enabled_types(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "xivchat-bridge.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Message store configuration.
    #[serde(default)]
    pub messages: MessagesConfig,
    /// Chat capture configuration.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load configuration, falling back to defaults when the file is missing or invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BridgeError::Config(e.to_string()))
    }

    /// Write the configuration back to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| BridgeError::Config(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
