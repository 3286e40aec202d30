//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::geo::GeoLocator;
use crate::service::ChatService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Chat service owning all matchmaking state.
    pub chat: Arc<ChatService>,
    /// Geolocation collaborator, queried once per connection.
    pub geo: Arc<GeoLocator>,
}
