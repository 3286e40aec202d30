//! Domain layer: core types, connection storage, and matchmaking state.
//!
//! This module contains the server-side domain model: user identity, the
//! per-connection entry with its outbound channel, server events, the
//! waiting pool, and the symmetric partner relation. None of these types
//! lock anything themselves; [`crate::service::ChatService`] owns them
//! behind a single mutex.

pub mod connection;
pub mod event;
pub mod partners;
pub mod registry;
pub mod user_id;
pub mod waiting;

pub use connection::{ConnectionEntry, ConnectionMeta};
pub use event::ServerEvent;
pub use partners::PartnerMap;
pub use registry::ConnectionRegistry;
pub use user_id::UserId;
pub use waiting::{WaitingEntry, WaitingPool};
