//! Connection storage keyed by user id.
//!
//! [`ConnectionRegistry`] is a plain map with no interior locking: all
//! mutation happens under the single state lock owned by
//! [`crate::service::ChatService`], which is what serializes registry
//! changes against matchmaking and teardown.

use std::collections::HashMap;

use super::{ConnectionEntry, UserId};
use crate::error::RelayError;

/// Sentinel tag injected by some clients' event serialization; never a
/// real interest tag and filtered out of every tag update.
pub const RESERVED_TAG: &str = "isTrusted";

/// Central store for all active connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<UserId, ConnectionEntry>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new connection entry.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DuplicateConnection`] if the id is already
    /// registered. The existing entry is never displaced; overwriting would
    /// silently orphan the prior connection's channel.
    pub fn register(&mut self, entry: ConnectionEntry) -> Result<(), RelayError> {
        let id = entry.id;
        if self.connections.contains_key(&id) {
            return Err(RelayError::DuplicateConnection(id));
        }
        self.connections.insert(id, entry);
        Ok(())
    }

    /// Replaces the stored tags for `id`, filtering out [`RESERVED_TAG`].
    ///
    /// Returns the filtered tags, or `None` when the id is not registered.
    pub fn set_tags(&mut self, id: UserId, tags: Vec<String>) -> Option<Vec<String>> {
        let entry = self.connections.get_mut(&id)?;
        let filtered: Vec<String> = tags.into_iter().filter(|t| t != RESERVED_TAG).collect();
        entry.tags.clone_from(&filtered);
        Some(filtered)
    }

    /// Looks up a connection entry.
    #[must_use]
    pub fn get(&self, id: UserId) -> Option<&ConnectionEntry> {
        self.connections.get(&id)
    }

    /// Returns `true` if the id is registered.
    #[must_use]
    pub fn contains(&self, id: UserId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Removes a connection entry, returning it if present.
    pub fn remove(&mut self, id: UserId) -> Option<ConnectionEntry> {
        self.connections.remove(&id)
    }

    /// Iterates over all registered entries.
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionEntry> {
        self.connections.values()
    }

    /// Returns the number of registered connections (the online count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
