//! Symmetric partner relation between paired connections.
//!
//! The relation is stored as two directed entries (A→B and B→A) that are
//! only ever inserted and removed together, so a half-formed pair cannot
//! be observed. A connection has at most one partner at a time.

use std::collections::HashMap;

use super::UserId;

/// The live pairing relation.
#[derive(Debug, Default)]
pub struct PartnerMap {
    partners: HashMap<UserId, UserId>,
}

impl PartnerMap {
    /// Creates an empty relation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `a` and `b` as partners, inserting both directions.
    ///
    /// Callers guarantee neither id is currently paired; `ChatService`
    /// checks this before matchmaking under its state lock.
    pub fn link(&mut self, a: UserId, b: UserId) {
        self.partners.insert(a, b);
        self.partners.insert(b, a);
    }

    /// Removes the pairing containing `id`, both directions at once.
    ///
    /// Returns the ex-partner's id when a pairing existed.
    pub fn unlink(&mut self, id: UserId) -> Option<UserId> {
        let partner = self.partners.remove(&id)?;
        self.partners.remove(&partner);
        Some(partner)
    }

    /// Returns the current partner of `id`, if any.
    #[must_use]
    pub fn partner_of(&self, id: UserId) -> Option<UserId> {
        self.partners.get(&id).copied()
    }

    /// Returns `true` if `id` is currently paired.
    #[must_use]
    pub fn contains(&self, id: UserId) -> bool {
        self.partners.contains_key(&id)
    }

    /// Returns the number of paired connections (twice the pair count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    /// Returns `true` if no pairings exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    /// Iterates over every id currently in the relation.
    pub fn ids(&self) -> impl Iterator<Item = UserId> {
        self.partners.keys().copied()
    }

    /// Checks that every directed entry has its mirror with the same value.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.partners
            .iter()
            .all(|(id, partner)| self.partners.get(partner) == Some(id))
    }
}
