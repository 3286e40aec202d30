//! WebSocket connection state machine.
//!
//! Drives the read/write loop for one user's connection: registers the
//! connection, dispatches inbound actions to [`ChatService`], forwards
//! queued server events, and funnels every exit path through the same
//! idempotent teardown.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::ClientAction;
use crate::app_state::AppState;
use crate::domain::{ConnectionEntry, ConnectionMeta, UserId};
use crate::service::ChatService;

/// Runs the full lifecycle for a single WebSocket connection.
///
/// Performs the one-time geolocation lookup, registers with the chat
/// service (refusing the socket on a duplicate id), then loops until the
/// client disconnects or the outbound channel closes.
pub async fn run_connection(
    socket: WebSocket,
    user_id: UserId,
    state: AppState,
    addr: Option<SocketAddr>,
    client_info: String,
) {
    let geo = state.geo.lookup(addr.map(|a| a.ip())).await;
    let meta = ConnectionMeta::new(addr, client_info, geo);

    let (sender, mut outbound_rx) = state.chat.outbound_channel();
    let entry = ConnectionEntry::new(user_id, sender, meta);

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Authoritative duplicate check: the pre-upgrade one in the handler
    // can lose a race between two simultaneous upgrades for the same id.
    if let Err(e) = state.chat.connect(entry).await {
        tracing::warn!(%user_id, error = %e, "refusing connection");
        let _ = ws_tx.close().await;
        return;
    }

    loop {
        tokio::select! {
            // Queued server event for this client
            event = outbound_rx.recv() => {
                let Some(event) = event else {
                    // Teardown dropped our sender; nothing more will come.
                    break;
                };
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(%user_id, error = %e, "event serialization failed");
                    }
                }
            }
            // Incoming frame from the client
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if handle_action(&state.chat, user_id, &text).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    // Uniform teardown for explicit and abrupt disconnects alike.
    state.chat.disconnect(user_id).await;
    tracing::debug!(%user_id, "ws connection closed");
}

/// Dispatches one inbound frame. Returns `true` when the connection
/// should terminate.
async fn handle_action(chat: &ChatService, user_id: UserId, text: &str) -> bool {
    match ClientAction::parse(text) {
        Some(ClientAction::Connect { tags }) => {
            chat.join(user_id, tags).await;
            false
        }
        Some(ClientAction::Message { message }) => {
            chat.relay(user_id, message).await;
            false
        }
        Some(ClientAction::Disconnect) => true,
        None => false,
    }
}
