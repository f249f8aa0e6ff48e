//! Selection of chat classifications that get recorded.

use std::collections::HashSet;

use super::kind::ChatKind;

/// Set of enabled chat classifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatFilter {
    enabled: HashSet<ChatKind>,
}

impl ChatFilter {
    /// Filter allowing exactly `kinds`.
    pub fn new(kinds: impl IntoIterator<Item = ChatKind>) -> Self {
        Self {
            enabled: kinds.into_iter().collect(),
        }
    }

    /// Whether lines of this classification are recorded.
    pub fn allows(&self, kind: ChatKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Enable or disable a classification. Returns true if anything changed.
    pub fn set_enabled(&mut self, kind: ChatKind, enabled: bool) -> bool {
        if enabled {
            self.enabled.insert(kind)
        } else {
            self.enabled.remove(&kind)
        }
    }

    /// Enabled classifications in host code order.
    pub fn enabled_kinds(&self) -> Vec<ChatKind> {
        ChatKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.enabled.contains(kind))
            .collect()
    }
}
