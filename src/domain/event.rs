//! Server-to-client chat events.
//!
//! Every state change visible to a client is expressed as a [`ServerEvent`]
//! and delivered through that connection's outbound channel. The JSON shape
//! is part of the wire protocol: a `type` discriminator plus variant fields.

use serde::Serialize;

use super::UserId;

/// Event pushed from the relay to a connected client.
///
/// Serializes with a `"type"` tag in `snake_case`, e.g.
/// `{"type":"connected","partner_id":2,"tags":["music"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A partner was found; both sides receive the other's id.
    Connected {
        /// The matched partner's id.
        partner_id: UserId,
        /// Tags shared by both sides at match time.
        tags: Vec<String>,
    },

    /// No partner available yet; the sender was enqueued.
    Waiting,

    /// Chat payload relayed from the current partner.
    Message {
        /// Id of the sending user.
        from: UserId,
        /// Opaque message payload.
        message: String,
    },

    /// The partner disconnected; the pairing no longer exists.
    Disconnected {
        /// Human-readable notice.
        message: String,
    },

    /// Updated count of currently registered connections.
    OnlineCount {
        /// Registry size at broadcast time.
        count: usize,
    },
}

impl ServerEvent {
    /// Builds the standard partner-disconnected notice.
    #[must_use]
    pub fn partner_disconnected() -> Self {
        Self::Disconnected {
            message: "Partner disconnected.".to_string(),
        }
    }
}
