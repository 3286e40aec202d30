//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::RelayError;

/// `GET /ws/{user_id}` — Upgrade to a WebSocket for the given user.
///
/// A duplicate live id is refused with `409 Conflict` before the upgrade;
/// registration inside the connection task remains the authoritative check.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<u64>,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let user_id = UserId::new(user_id);

    if state.chat.is_registered(user_id).await {
        return RelayError::DuplicateConnection(user_id).into_response();
    }

    let client_info = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    ws.on_upgrade(move |socket| {
        run_connection(socket, user_id, state, Some(addr), client_info)
    })
}
