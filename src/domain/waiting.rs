//! FIFO pool of connections seeking a partner.
//!
//! Entries hold a snapshot of the tags declared at join time. Matching is
//! front-to-back, so among equally-compatible candidates the earliest
//! enqueued wins. `find_match` removes the returned entry as part of the
//! call, so the same entry can never be handed out twice.

use std::collections::VecDeque;

use super::UserId;

/// A connection waiting to be paired, with its tag snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingEntry {
    /// The waiting connection's id.
    pub id: UserId,
    /// Tags declared on the join that enqueued this entry.
    pub tags: Vec<String>,
}

/// Returns `true` when two tag sets are compatible for pairing.
///
/// Either side declaring no tags matches anyone; otherwise at least one
/// tag must be shared. The single-side-empty rule is an intentional
/// broad-matching policy, preserved exactly.
#[must_use]
pub fn tags_compatible(a: &[String], b: &[String]) -> bool {
    a.is_empty() || b.is_empty() || a.iter().any(|tag| b.contains(tag))
}

/// Ordered collection of connections seeking a partner.
#[derive(Debug, Default)]
pub struct WaitingPool {
    entries: VecDeque<WaitingEntry>,
}

impl WaitingPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a waiting entry at the back.
    ///
    /// Callers guarantee at most one entry per id; `ChatService` only
    /// enqueues ids that are neither waiting nor paired.
    pub fn enqueue(&mut self, id: UserId, tags: Vec<String>) {
        self.entries.push_back(WaitingEntry { id, tags });
    }

    /// Removes the entry for `id` if one exists.
    ///
    /// Returns `true` when an entry was removed.
    pub fn remove_if_present(&mut self, id: UserId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Finds and removes the first entry compatible with `tags`.
    ///
    /// The scan starts at the front, so FIFO order breaks ties. Removal is
    /// part of the call: once returned, the entry is no longer in the pool.
    pub fn find_match(&mut self, tags: &[String]) -> Option<WaitingEntry> {
        let position = self
            .entries
            .iter()
            .position(|entry| tags_compatible(tags, &entry.tags))?;
        self.entries.remove(position)
    }

    /// Returns `true` if `id` has a waiting entry.
    #[must_use]
    pub fn contains(&self, id: UserId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Returns the number of waiting entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no one is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
