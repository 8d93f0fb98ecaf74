//! The pending-entry queue: a FIFO backlog of entries awaiting mining.

use std::collections::VecDeque;

use crate::entry::Entry;
use crate::types::EntryId;

/// FIFO queue of pending entries.
#[derive(Debug, Clone, Default)]
pub struct EntryQueue {
    entries: VecDeque<Entry>,
}

impl EntryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the tail.
    pub fn enqueue(&mut self, entry: Entry) {
        self.entries.push_back(entry);
    }

    /// Remove the oldest entry.
    pub fn pop_front(&mut self) -> Option<Entry> {
        self.entries.pop_front()
    }

    /// Put an entry back at the head, ahead of everything queued after it.
    pub fn requeue(&mut self, entry: Entry) {
        self.entries.push_front(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether an entry is still waiting.
    pub fn contains(&self, id: &EntryId) -> bool {
        self.entries.iter().any(|e| &e.entry_id == id)
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}
