//! WebSocket layer: upgrade handling, per-connection loop, wire actions.
//!
//! The endpoint at `/ws/{user_id}` carries one long-lived bidirectional
//! connection per user; all chat traffic flows over it.

pub mod connection;
pub mod handler;
pub mod messages;
