//! HTTP API layer: system endpoints and router composition.

pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Builds the REST portion of the router.
pub fn build_router() -> Router<AppState> {
    system::routes()
}
