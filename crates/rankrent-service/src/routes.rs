//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{credits, health, purchases, search, universe, webhooks};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent searches. Each one holds upstream calls open for the
/// length of the paced metrics loop.
const SEARCH_MAX_CONCURRENT_REQUESTS: usize = 10;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Search (JWT auth, long timeout)
/// - `POST /v1/search` - Run a metered niche search
///
/// ## Universe (JWT auth)
/// - `GET /v1/cities` - List cities, optionally by population
/// - `GET /v1/niches` - List niches
///
/// ## Credits (JWT auth)
/// - `GET /v1/credits/balance` - Current balance
/// - `GET /v1/credits/usage` - Charged searches, newest first
/// - `POST /v1/checkout` - Start a credit purchase
/// - `GET /v1/purchases` - Purchase history
/// - `GET /v1/purchases/:session_id` - Purchase status
///
/// ## Admin (`X-Admin-Key`)
/// - `PUT /v1/admin/cities` - Replace the city universe
/// - `PUT /v1/admin/niches` - Replace the niche universe
///
/// ## Webhooks (Signature verification)
/// - `POST /webhooks/stripe` - Stripe checkout events
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);
    let search_timeout = Duration::from_secs(state.config.search_timeout_seconds);

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Searches pace their metrics calls, so they get their own timeout and a
    // tighter concurrency limit.
    let search_routes = Router::new()
        .route("/search", post(search::search))
        .layer(TimeoutLayer::new(search_timeout))
        .layer(ConcurrencyLimitLayer::new(SEARCH_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Universe
        .route("/cities", get(universe::list_cities))
        .route("/niches", get(universe::list_niches))
        .route("/admin/cities", put(universe::replace_cities))
        .route("/admin/niches", put(universe::replace_niches))
        // Credits
        .route("/credits/balance", get(credits::get_balance))
        .route("/credits/usage", get(credits::list_usage))
        // Purchases
        .route("/checkout", post(purchases::create_checkout))
        .route("/purchases", get(purchases::list_purchases))
        .route("/purchases/:session_id", get(purchases::get_purchase))
        .layer(TimeoutLayer::new(request_timeout))
        .merge(search_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - controlled by Stripe)
        .route(
            "/webhooks/stripe",
            post(webhooks::stripe_webhook).layer(TimeoutLayer::new(request_timeout)),
        )
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
