//! Chat service: the single mutual-exclusion domain for matchmaking state.
//!
//! [`ChatService`] owns the connection registry, waiting pool, and partner
//! map behind one `tokio::sync::Mutex`. Every operation locks once and runs
//! its full lookup → mutate → notify sequence inside that critical section,
//! so a disconnect racing a join can never observe a half-formed pairing or
//! hand the same waiting entry to two joiners. Notifications use bounded
//! non-blocking channel sends, so a stalled peer cannot hold the lock.

use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use utoipa::ToSchema;

use crate::domain::{
    ConnectionEntry, ConnectionRegistry, PartnerMap, ServerEvent, UserId, WaitingPool,
};
use crate::error::RelayError;

/// All shared matchmaking state, guarded as a unit.
#[derive(Debug, Default)]
struct ChatBoard {
    registry: ConnectionRegistry,
    waiting: WaitingPool,
    partners: PartnerMap,
}

/// Point-in-time counters for the observability surface.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct RelayStats {
    /// Currently registered connections.
    pub online: usize,
    /// Connections waiting for a partner.
    pub waiting: usize,
    /// Connections currently paired (twice the pair count).
    pub paired: usize,
}

/// Orchestration layer for connection lifecycle, pairing, and relay.
#[derive(Debug)]
pub struct ChatService {
    board: Mutex<ChatBoard>,
    send_queue_capacity: usize,
}

impl ChatService {
    /// Creates a service with the given per-connection outbound queue
    /// capacity.
    #[must_use]
    pub fn new(send_queue_capacity: usize) -> Self {
        Self {
            board: Mutex::new(ChatBoard::default()),
            send_queue_capacity,
        }
    }

    /// Creates the outbound event channel for a new connection.
    ///
    /// The sender goes into the [`ConnectionEntry`]; the receiver is drained
    /// by that connection's WebSocket task.
    #[must_use]
    pub fn outbound_channel(&self) -> (mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
        mpsc::channel(self.send_queue_capacity)
    }

    /// Returns `true` if a live connection exists for `id`.
    pub async fn is_registered(&self, id: UserId) -> bool {
        self.board.lock().await.registry.contains(id)
    }

    /// Registers a newly accepted connection and broadcasts the updated
    /// online count to everyone.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DuplicateConnection`] if a live connection
    /// already exists for this id; the caller must refuse the new socket.
    pub async fn connect(&self, entry: ConnectionEntry) -> Result<(), RelayError> {
        let mut board = self.board.lock().await;
        let id = entry.id;
        let meta = entry.meta.clone();
        board.registry.register(entry)?;
        tracing::info!(
            user_id = %id,
            addr = ?meta.addr,
            city = %meta.geo.city,
            region = %meta.geo.region,
            country = %meta.geo.country,
            client = %meta.client_info,
            "user connected"
        );
        broadcast_online_count(&board.registry);
        Ok(())
    }

    /// Handles a `connect` action: stores the (filtered) tags and either
    /// pairs `id` with the first compatible waiter or enqueues it.
    ///
    /// Idempotent against duplicate joins while paired. A join while
    /// already waiting replaces the waiting entry with the new tags; the
    /// entry is pulled before matching so a connection can never be paired
    /// with itself.
    pub async fn join(&self, id: UserId, tags: Vec<String>) {
        let mut board = self.board.lock().await;

        if board.partners.contains(id) {
            return;
        }
        let Some(tags) = board.registry.set_tags(id, tags) else {
            // Already terminated; absorbing state.
            return;
        };
        tracing::info!(user_id = %id, ?tags, "user joining");

        board.waiting.remove_if_present(id);

        if let Some(matched) = board.waiting.find_match(&tags) {
            let common: Vec<String> = tags
                .iter()
                .filter(|tag| matched.tags.contains(tag))
                .cloned()
                .collect();
            board.partners.link(id, matched.id);
            tracing::info!(user_id = %id, partner_id = %matched.id, common_tags = ?common, "users paired");

            if let Some(entry) = board.registry.get(id) {
                entry.send(ServerEvent::Connected {
                    partner_id: matched.id,
                    tags: common.clone(),
                });
            }
            if let Some(entry) = board.registry.get(matched.id) {
                entry.send(ServerEvent::Connected {
                    partner_id: id,
                    tags: common,
                });
            }
        } else {
            board.waiting.enqueue(id, tags);
            if let Some(entry) = board.registry.get(id) {
                entry.send(ServerEvent::Waiting);
            }
        }
    }

    /// Relays a payload from `id` to its current partner.
    ///
    /// Silent no-op when `id` has no partner or the partner's channel is
    /// no longer open; relay failures are never surfaced to the sender.
    pub async fn relay(&self, id: UserId, payload: String) {
        let board = self.board.lock().await;

        let Some(partner_id) = board.partners.partner_of(id) else {
            return;
        };
        let Some(partner) = board.registry.get(partner_id) else {
            return;
        };
        if !partner.is_open() {
            return;
        }
        tracing::debug!(from = %id, to = %partner_id, "relaying message");
        partner.send(ServerEvent::Message {
            from: id,
            message: payload,
        });
    }

    /// Tears down all state for `id` after an explicit disconnect action
    /// or an abrupt socket closure.
    ///
    /// Effects, in order: notify a paired partner and unlink both
    /// directions, drop any waiting entry, remove the registry entry,
    /// broadcast the updated online count. Idempotent: returns `false`
    /// without side effects when `id` is already gone, so the explicit
    /// action and the closure path can both fire safely.
    pub async fn disconnect(&self, id: UserId) -> bool {
        let mut board = self.board.lock().await;

        if !board.registry.contains(id) {
            return false;
        }

        if let Some(ex_partner) = board.partners.unlink(id) {
            tracing::info!(user_id = %id, partner_id = %ex_partner, "user disconnected from pair");
            if let Some(entry) = board.registry.get(ex_partner)
                && entry.is_open()
            {
                entry.send(ServerEvent::partner_disconnected());
            }
        }

        board.waiting.remove_if_present(id);
        board.registry.remove(id);
        tracing::info!(user_id = %id, online = board.registry.len(), "user disconnected");
        broadcast_online_count(&board.registry);
        true
    }

    /// Returns point-in-time counters for the observability endpoints.
    pub async fn stats(&self) -> RelayStats {
        let board = self.board.lock().await;
        RelayStats {
            online: board.registry.len(),
            waiting: board.waiting.len(),
            paired: board.partners.len(),
        }
    }
}

/// Sends the current online count to every registered connection.
///
/// Called under the state lock after every completed connect and
/// disconnect; sends are non-blocking.
fn broadcast_online_count(registry: &ConnectionRegistry) {
    let count = registry.len();
    for entry in registry.iter() {
        entry.send(ServerEvent::OnlineCount { count });
    }
}

#[cfg(test)]
impl ChatService {
    /// Checks the structural invariants: the partner relation is symmetric
    /// and no paired id has a waiting entry.
    async fn invariants_hold(&self) -> bool {
        let board = self.board.lock().await;
        board.partners.is_symmetric()
            && board.partners.ids().all(|id| !board.waiting.contains(id))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ConnectionMeta;
    use crate::geo::GeoInfo;

    fn service() -> ChatService {
        ChatService::new(16)
    }

    async fn connect_user(chat: &ChatService, id: u64) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = chat.outbound_channel();
        let meta = ConnectionMeta::new(None, String::new(), GeoInfo::default());
        let entry = ConnectionEntry::new(UserId::new(id), tx, meta);
        let Ok(()) = chat.connect(entry).await else {
            panic!("connect failed for user {id}");
        };
        rx
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    /// Drains everything currently queued for a connection.
    fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn connect_broadcasts_online_count() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        assert_eq!(drain(&mut rx1), vec![ServerEvent::OnlineCount { count: 1 }]);

        let mut rx2 = connect_user(&chat, 2).await;
        assert_eq!(drain(&mut rx1), vec![ServerEvent::OnlineCount { count: 2 }]);
        assert_eq!(drain(&mut rx2), vec![ServerEvent::OnlineCount { count: 2 }]);
    }

    #[tokio::test]
    async fn duplicate_connect_is_refused() {
        let chat = service();
        let _rx = connect_user(&chat, 1).await;

        let (tx, _rx2) = chat.outbound_channel();
        let meta = ConnectionMeta::new(None, String::new(), GeoInfo::default());
        let result = chat
            .connect(ConnectionEntry::new(UserId::new(1), tx, meta))
            .await;
        assert!(matches!(result, Err(RelayError::DuplicateConnection(_))));
        assert_eq!(chat.stats().await.online, 1);
    }

    #[tokio::test]
    async fn overlapping_tags_pair_with_common_intersection() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        let mut rx2 = connect_user(&chat, 2).await;
        drain(&mut rx1);
        drain(&mut rx2);

        chat.join(UserId::new(1), tags(&["music"])).await;
        assert_eq!(drain(&mut rx1), vec![ServerEvent::Waiting]);

        chat.join(UserId::new(2), tags(&["music", "art"])).await;
        assert_eq!(
            drain(&mut rx1),
            vec![ServerEvent::Connected {
                partner_id: UserId::new(2),
                tags: tags(&["music"]),
            }]
        );
        assert_eq!(
            drain(&mut rx2),
            vec![ServerEvent::Connected {
                partner_id: UserId::new(1),
                tags: tags(&["music"]),
            }]
        );
        assert!(chat.invariants_hold().await);
    }

    #[tokio::test]
    async fn disjoint_tags_never_match() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        let mut rx2 = connect_user(&chat, 2).await;
        drain(&mut rx1);
        drain(&mut rx2);

        chat.join(UserId::new(1), tags(&["music"])).await;
        chat.join(UserId::new(2), tags(&["sports"])).await;

        assert_eq!(drain(&mut rx1), vec![ServerEvent::Waiting]);
        assert_eq!(drain(&mut rx2), vec![ServerEvent::Waiting]);
        let stats = chat.stats().await;
        assert_eq!(stats.waiting, 2);
        assert_eq!(stats.paired, 0);
        assert!(chat.invariants_hold().await);
    }

    #[tokio::test]
    async fn empty_tags_match_anyone() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        let mut rx2 = connect_user(&chat, 2).await;
        drain(&mut rx1);
        drain(&mut rx2);

        chat.join(UserId::new(1), tags(&["music"])).await;
        chat.join(UserId::new(2), vec![]).await;

        assert_eq!(
            drain(&mut rx2),
            vec![ServerEvent::Connected {
                partner_id: UserId::new(1),
                tags: vec![],
            }]
        );
        assert_eq!(chat.stats().await.paired, 2);
    }

    #[tokio::test]
    async fn fifo_fairness_among_equal_matches() {
        let chat = service();
        let mut receivers = Vec::new();
        for id in 1..=3 {
            let mut rx = connect_user(&chat, id).await;
            drain(&mut rx);
            receivers.push(rx);
        }
        for id in 1..=3 {
            chat.join(UserId::new(id), tags(&["music"])).await;
        }
        for rx in &mut receivers {
            drain(rx);
        }

        let mut rx4 = connect_user(&chat, 4).await;
        drain(&mut rx4);
        chat.join(UserId::new(4), tags(&["music"])).await;

        assert_eq!(
            drain(&mut rx4),
            vec![ServerEvent::Connected {
                partner_id: UserId::new(1),
                tags: tags(&["music"]),
            }]
        );
        assert!(chat.invariants_hold().await);
    }

    #[tokio::test]
    async fn join_while_paired_is_noop() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        let mut rx2 = connect_user(&chat, 2).await;
        chat.join(UserId::new(1), vec![]).await;
        chat.join(UserId::new(2), vec![]).await;
        drain(&mut rx1);
        drain(&mut rx2);

        chat.join(UserId::new(1), tags(&["music"])).await;
        assert!(drain(&mut rx1).is_empty());
        assert_eq!(chat.stats().await.waiting, 0);
    }

    #[tokio::test]
    async fn rejoin_while_waiting_replaces_entry_without_self_match() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        drain(&mut rx1);

        chat.join(UserId::new(1), tags(&["music"])).await;
        chat.join(UserId::new(1), tags(&["art"])).await;

        assert_eq!(
            drain(&mut rx1),
            vec![ServerEvent::Waiting, ServerEvent::Waiting]
        );
        let stats = chat.stats().await;
        assert_eq!(stats.waiting, 1);
        assert_eq!(stats.paired, 0);

        // The replaced entry carries the new tags.
        let mut rx2 = connect_user(&chat, 2).await;
        drain(&mut rx2);
        chat.join(UserId::new(2), tags(&["music"])).await;
        assert_eq!(drain(&mut rx2), vec![ServerEvent::Waiting]);
    }

    #[tokio::test]
    async fn relay_delivers_to_partner() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        let mut rx2 = connect_user(&chat, 2).await;
        chat.join(UserId::new(1), vec![]).await;
        chat.join(UserId::new(2), vec![]).await;
        drain(&mut rx1);
        drain(&mut rx2);

        chat.relay(UserId::new(1), "hello".to_string()).await;
        assert_eq!(
            drain(&mut rx2),
            vec![ServerEvent::Message {
                from: UserId::new(1),
                message: "hello".to_string(),
            }]
        );
        assert!(drain(&mut rx1).is_empty());
    }

    #[tokio::test]
    async fn relay_unpaired_is_silent() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        drain(&mut rx1);

        chat.relay(UserId::new(1), "into the void".to_string()).await;
        assert!(drain(&mut rx1).is_empty());
    }

    #[tokio::test]
    async fn disconnect_paired_notifies_partner_once() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        let mut rx2 = connect_user(&chat, 2).await;
        chat.join(UserId::new(1), tags(&["music"])).await;
        chat.join(UserId::new(2), tags(&["music", "art"])).await;
        drain(&mut rx1);
        drain(&mut rx2);

        assert!(chat.disconnect(UserId::new(1)).await);
        assert_eq!(
            drain(&mut rx2),
            vec![
                ServerEvent::partner_disconnected(),
                ServerEvent::OnlineCount { count: 1 },
            ]
        );

        // Ex-partner is unpaired but not re-enqueued.
        let stats = chat.stats().await;
        assert_eq!(stats.online, 1);
        assert_eq!(stats.paired, 0);
        assert_eq!(stats.waiting, 0);

        // And the ex-partner's next message goes nowhere, silently.
        chat.relay(UserId::new(2), "anyone?".to_string()).await;
        assert!(drain(&mut rx2).is_empty());
        assert!(chat.invariants_hold().await);
    }

    #[tokio::test]
    async fn disconnect_unpaired_touches_only_registry() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        let mut rx2 = connect_user(&chat, 2).await;
        drain(&mut rx1);
        drain(&mut rx2);

        assert!(chat.disconnect(UserId::new(1)).await);
        assert_eq!(drain(&mut rx2), vec![ServerEvent::OnlineCount { count: 1 }]);
    }

    #[tokio::test]
    async fn disconnect_waiting_removes_pool_entry() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        drain(&mut rx1);
        chat.join(UserId::new(1), tags(&["music"])).await;

        assert!(chat.disconnect(UserId::new(1)).await);
        let stats = chat.stats().await;
        assert_eq!(stats.waiting, 0);
        assert_eq!(stats.online, 0);

        // A later joiner must not be matched against the departed entry.
        let mut rx2 = connect_user(&chat, 2).await;
        drain(&mut rx2);
        chat.join(UserId::new(2), tags(&["music"])).await;
        assert_eq!(drain(&mut rx2), vec![ServerEvent::Waiting]);
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        let mut rx2 = connect_user(&chat, 2).await;
        chat.join(UserId::new(1), vec![]).await;
        chat.join(UserId::new(2), vec![]).await;
        drain(&mut rx1);
        drain(&mut rx2);

        assert!(chat.disconnect(UserId::new(1)).await);
        // Second teardown for the same id: absorbing, no effects.
        assert!(!chat.disconnect(UserId::new(1)).await);

        let events = drain(&mut rx2);
        let disconnects = events
            .iter()
            .filter(|e| matches!(e, ServerEvent::Disconnected { .. }))
            .count();
        assert_eq!(disconnects, 1);
    }

    #[tokio::test]
    async fn join_after_disconnect_is_absorbed() {
        let chat = service();
        let mut rx1 = connect_user(&chat, 1).await;
        drain(&mut rx1);
        assert!(chat.disconnect(UserId::new(1)).await);

        chat.join(UserId::new(1), tags(&["music"])).await;
        let stats = chat.stats().await;
        assert_eq!(stats.waiting, 0);
        assert_eq!(stats.online, 0);
    }
}
