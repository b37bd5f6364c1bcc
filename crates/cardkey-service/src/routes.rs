//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{cards, health, tokens};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `POST /api/cards` - Generate a batch of card keys
/// - `GET /api/cards` - List every issued card
/// - `POST /api/validate` - Check a key without consuming it
/// - `POST /api/tokens` - Redeem a key by binding a token
/// - `GET /api/tokens` - Redemption log, newest first
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/cards",
            post(cards::generate_cards).get(cards::list_cards),
        )
        .route("/api/validate", post(cards::validate_card))
        .route(
            "/api/tokens",
            post(tokens::redeem_card).get(tokens::list_redemptions),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(Arc::new(state))
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}
