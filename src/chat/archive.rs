//! On-disk persistence of the message store.
//!
//! The archive is a single JSON array of chat messages. It is read once at
//! startup and rewritten as a whole at shutdown.

use std::fs;
use std::path::{Path, PathBuf};

use super::message::ChatMessage;
use crate::Result;

/// File name of the archive inside the plugin config directory.
pub const ARCHIVE_FILE_NAME: &str = "storage.json";

/// Reads and writes the persisted message list.
#[derive(Debug, Clone)]
pub struct MessageArchive {
    path: PathBuf,
}

impl MessageArchive {
    /// Archive stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Archive stored under `dir` with the default file name.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(ARCHIVE_FILE_NAME))
    }

    /// Path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the archive.
    ///
    /// A missing, empty, or unreadable file yields an empty list; only the
    /// latter two are worth a warning. Entries that fail to decode are
    /// skipped with a warning and the rest are kept.
    pub fn load(&self) -> Vec<ChatMessage> {
        if !self.path.exists() {
            tracing::debug!("No message archive at {}", self.path.display());
            return Vec::new();
        }

        match self.try_load() {
            Ok(messages) => {
                tracing::info!(
                    count = messages.len(),
                    "Restored messages from {}",
                    self.path.display()
                );
                messages
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read message archive {}: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<ChatMessage>> {
        let data = fs::read(&self.path)?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "archive is empty",
            )
            .into());
        }
        let entries: Vec<serde_json::Value> = serde_json::from_slice(&data)?;
        let total = entries.len();
        let messages: Vec<ChatMessage> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                serde_json::from_value(entry)
                    .map_err(|e| tracing::warn!(index, "Skipping archived message: {}", e))
                    .ok()
            })
            .collect();
        if messages.len() < total {
            tracing::warn!(
                skipped = total - messages.len(),
                "Dropped unreadable entries from {}",
                self.path.display()
            );
        }
        Ok(messages)
    }

    /// Rewrite the archive with `messages`.
    ///
    /// The new content goes to a sibling temp file first and then replaces the
    /// archive, so a crash mid-write leaves the previous archive intact.
    pub fn save(&self, messages: &[ChatMessage]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_vec(messages)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;

        tracing::info!(
            count = messages.len(),
            "Saved messages to {}",
            self.path.display()
        );
        Ok(())
    }
}
