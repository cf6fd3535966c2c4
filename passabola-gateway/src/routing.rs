use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::Router;
use passabola_core::Platform;
use tower_http::trace::TraceLayer;

use crate::auth_routes::router as auth_router;
use crate::config::SecurityConfig;
use crate::health::router as health_router;
use crate::resource_routes::router as resource_router;
use crate::security::{enforce_auth, SecurityState};

pub const PLAYERS_PATH: &str = "/api/players";
pub const EVENTS_PATH: &str = "/api/events";

pub fn build_app(platform: &Platform, security: &SecurityConfig) -> Router {
    let security_state = Arc::new(SecurityState::new(
        security.clone(),
        platform.tokens().clone(),
    ));
    let cors = security_state.cors_layer();

    Router::new()
        .merge(health_router())
        .merge(auth_router(platform.users.clone()))
        .merge(resource_router(platform.players.clone(), PLAYERS_PATH))
        .merge(resource_router(platform.events.clone(), EVENTS_PATH))
        .layer(from_fn_with_state(security_state, enforce_auth))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
