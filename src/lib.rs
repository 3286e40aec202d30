//! # mingle-relay
//!
//! WebSocket relay server for anonymous random-pairing chat. Clients open
//! one long-lived connection per user, optionally declare interest tags,
//! and are paired with another waiting client sharing at least one tag
//! (or unconditionally when either side declares none). Once paired,
//! messages are relayed between the two until either disconnects.
//!
//! All state is in-memory and ephemeral; there is no persistence,
//! authentication, or content moderation.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket /ws/{user_id}, HTTP)
//!     │
//!     ├── WS Handler + Connection Loop (ws/)
//!     ├── System Endpoints (api/)
//!     │
//!     ├── ChatService (service/)  ← single state lock
//!     │
//!     ├── ConnectionRegistry ─ WaitingPool ─ PartnerMap (domain/)
//!     │
//!     └── GeoLocator (geo) — logging metadata only
//! ```

pub mod api;
pub mod app;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod geo;
pub mod service;
pub mod ws;
