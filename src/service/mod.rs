//! Service layer: lifecycle coordination over the shared matchmaking state.

pub mod chat;

pub use chat::{ChatService, RelayStats};
