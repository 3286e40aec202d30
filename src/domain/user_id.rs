//! Type-safe user identifier.
//!
//! [`UserId`] is a newtype wrapper around the caller-supplied integer taken
//! from the WebSocket path (`/ws/{user_id}`). Identifiers are opaque and
//! unauthenticated; type safety keeps them from being confused with counts
//! or other integers flowing through the relay.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a connected user.
///
/// Supplied by the client in the connection path and immutable for the
/// lifetime of the connection. Used as the dictionary key in the
/// [`super::ConnectionRegistry`], the [`super::WaitingPool`], and the
/// [`super::PartnerMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Creates a `UserId` from its raw integer value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn display_is_raw_integer() {
        let id = UserId::new(42);
        assert_eq!(format!("{id}"), "42");
    }

    #[test]
    fn serde_is_transparent() {
        let id = UserId::new(7);
        let json = serde_json::to_string(&id).ok();
        let Some(json) = json else {
            panic!("serialization failed");
        };
        assert_eq!(json, "7");
        let back: UserId = serde_json::from_str(&json).ok().unwrap_or_else(|| {
            panic!("deserialization failed");
        });
        assert_eq!(back, id);
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = UserId::new(1);
        let mut map = HashMap::new();
        map.insert(id, "test");
        assert_eq!(map.get(&id), Some(&"test"));
    }

    #[test]
    fn raw_round_trip() {
        let id = UserId::from(99);
        assert_eq!(id.get(), 99);
        assert_eq!(u64::from(id), 99);
    }
}
