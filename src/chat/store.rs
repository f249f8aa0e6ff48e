//! Bounded store of received chat messages.
//!
//! Appends come from the host's chat callback, snapshots from HTTP handlers.
//! The store synchronizes internally; callers never lock.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use super::message::ChatMessage;

/// Bounded ring. Storage grows with use up to `capacity`.
#[derive(Debug)]
struct Ring {
    entries: VecDeque<ChatMessage>,
    capacity: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    fn push(&mut self, message: ChatMessage) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }
}

/// Ordered, bounded, thread-safe collection of chat messages.
///
/// When full, appending evicts the oldest message first.
#[derive(Debug)]
pub struct MessageStore {
    ring: RwLock<Ring>,
}

impl MessageStore {
    /// Create an empty store. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: RwLock::new(Ring::new(capacity.max(1))),
        }
    }

    /// Maximum number of messages kept.
    pub fn capacity(&self) -> usize {
        self.ring
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity
    }

    /// Current number of messages.
    pub fn len(&self) -> usize {
        self.ring
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Whether the store holds no messages.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a message, evicting the oldest one when at capacity.
    pub fn append(&self, message: ChatMessage) {
        self.ring
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    /// Ordered copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.ring
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .cloned()
            .collect()
    }

    /// Replace the contents with `messages`.
    ///
    /// If more messages are given than fit, only the newest are kept.
    pub fn restore(&self, messages: Vec<ChatMessage>) {
        let mut ring = self.ring.write().unwrap_or_else(PoisonError::into_inner);
        ring.entries.clear();
        let skip = messages.len().saturating_sub(ring.capacity);
        for message in messages.into_iter().skip(skip) {
            ring.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatKind;

    fn msg(text: &str) -> ChatMessage {
        ChatMessage::new(ChatKind::Say, "sender", text)
    }

    fn texts(store: &MessageStore) -> Vec<String> {
        store.snapshot().into_iter().map(|m| m.text).collect()
    }

    #[test]
    fn test_append_in_order() {
        let store = MessageStore::new(10);
        store.append(msg("a"));
        store.append(msg("b"));
        assert_eq!(texts(&store), vec!["a", "b"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_capacity_two_evicts_oldest() {
        let store = MessageStore::new(2);
        store.append(msg("m1"));
        store.append(msg("m2"));
        store.append(msg("m3"));
        assert_eq!(texts(&store), vec!["m2", "m3"]);
    }

    #[test]
    fn test_keeps_last_capacity_messages() {
        let capacity = 7;
        let store = MessageStore::new(capacity);
        for i in 0..50 {
            store.append(msg(&i.to_string()));
        }
        let expected: Vec<String> = (43..50).map(|i| i.to_string()).collect();
        assert_eq!(texts(&store), expected);
        assert_eq!(store.len(), capacity);
    }

    #[test]
    fn test_zero_capacity_raised_to_one() {
        let store = MessageStore::new(0);
        assert_eq!(store.capacity(), 1);
        store.append(msg("a"));
        store.append(msg("b"));
        assert_eq!(texts(&store), vec!["b"]);
    }

    #[test]
    fn test_large_capacity_allocates_lazily() {
        let store = MessageStore::new(usize::MAX);
        store.append(msg("a"));
        assert_eq!(store.capacity(), usize::MAX);
        assert_eq!(texts(&store), vec!["a"]);
        assert!(store.ring.read().unwrap().entries.capacity() < 1024);
    }

    #[test]
    fn test_restore_replaces_contents() {
        let store = MessageStore::new(5);
        store.append(msg("old"));
        store.restore(vec![msg("x"), msg("y")]);
        assert_eq!(texts(&store), vec!["x", "y"]);

        store.append(msg("z"));
        assert_eq!(texts(&store), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_restore_truncates_to_newest() {
        let store = MessageStore::new(2);
        store.restore(vec![msg("1"), msg("2"), msg("3")]);
        assert_eq!(texts(&store), vec!["2", "3"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = MessageStore::new(3);
        store.append(msg("a"));
        let snapshot = store.snapshot();
        store.append(msg("b"));
        assert_eq!(snapshot.len(), 1);
        assert!(store.len() == 2 && !store.is_empty());
    }
}
