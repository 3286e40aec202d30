//! Client-to-server WebSocket actions.
//!
//! Inbound frames are JSON objects with a required `action` discriminator.
//! Frames that fail to parse (unknown action, missing fields, non-JSON)
//! are ignored and the connection stays open.

use serde::Deserialize;

/// Actions a client can send over its WebSocket.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    /// Declare interest tags and request a partner.
    Connect {
        /// Interest tags; empty or absent means "match anyone".
        #[serde(default)]
        tags: Vec<String>,
    },
    /// Relay a payload to the current partner.
    Message {
        /// Opaque message payload.
        message: String,
    },
    /// Gracefully leave; same teardown as an abrupt closure.
    Disconnect,
}

impl ClientAction {
    /// Parses an inbound text frame, returning `None` on any malformed
    /// or unroutable input.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(action) => Some(action),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed client frame");
                None
            }
        }
    }
}
