//! Per-connection state held by the registry.
//!
//! A [`ConnectionEntry`] couples a user's identity and tags with the
//! outbound event channel feeding their WebSocket task. Delivery is
//! best-effort: sends never block matchmaking, and a stalled peer drops
//! events instead of holding the shared-state lock.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{ServerEvent, UserId};
use crate::geo::GeoInfo;

/// Observability metadata attached to a connection.
///
/// Carried for logging only; never consulted by pairing or relay logic.
#[derive(Debug, Clone)]
pub struct ConnectionMeta {
    /// Origin socket address, when known.
    pub addr: Option<SocketAddr>,
    /// Descriptive client info (e.g. the `User-Agent` header).
    pub client_info: String,
    /// Best-effort geolocation of the origin address.
    pub geo: GeoInfo,
    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,
}

impl ConnectionMeta {
    /// Creates metadata stamped with the current time.
    #[must_use]
    pub fn new(addr: Option<SocketAddr>, client_info: String, geo: GeoInfo) -> Self {
        Self {
            addr,
            client_info,
            geo,
            connected_at: Utc::now(),
        }
    }
}

/// State for one active connection.
#[derive(Debug)]
pub struct ConnectionEntry {
    /// The connection's user id.
    pub id: UserId,
    /// Interest tags, replaced on each `connect` action from this user.
    pub tags: Vec<String>,
    /// Observability metadata.
    pub meta: ConnectionMeta,
    sender: mpsc::Sender<ServerEvent>,
}

impl ConnectionEntry {
    /// Creates an entry with no tags declared yet.
    #[must_use]
    pub fn new(id: UserId, sender: mpsc::Sender<ServerEvent>, meta: ConnectionMeta) -> Self {
        Self {
            id,
            tags: Vec::new(),
            meta,
            sender,
        }
    }

    /// Returns `true` while the connection's WebSocket task still holds
    /// the receiving end of the outbound channel.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queues an event for delivery, best-effort.
    ///
    /// Returns `false` when the channel is closed or full; the event is
    /// dropped and the failure is logged, never propagated.
    pub fn send(&self, event: ServerEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(user_id = %self.id, "dropping event for closed connection");
                false
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(user_id = %self.id, "outbound queue full, dropping event");
                false
            }
        }
    }
}
