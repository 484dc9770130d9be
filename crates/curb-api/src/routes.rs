//! Route configuration for the marketplace API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    cancel_trade, confirm_cash_delivered, create_listing, dispute_trade, fund_escrow, get_escrow,
    get_listing, get_profile, get_transaction, health_check, list_listings, list_transactions,
    open_trade, release_escrow,
};
use crate::state::ApiState;

/// Create the API router.
pub fn create_router(state: Arc<ApiState>) -> Router {
    let cors = build_cors_layer(state.config());

    let api_routes = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Listing endpoints
        .route("/listings", get(list_listings).post(create_listing))
        .route("/listings/{id}", get(get_listing))
        // Transaction endpoints
        .route("/transactions", get(list_transactions).post(open_trade))
        .route("/transactions/{id}", get(get_transaction))
        .route(
            "/transactions/{id}/cash-delivered",
            post(confirm_cash_delivered),
        )
        .route("/transactions/{id}/cancel", post(cancel_trade))
        .route("/transactions/{id}/dispute", post(dispute_trade))
        // Escrow endpoints
        .route("/escrows/{id}", get(get_escrow))
        .route("/escrows/{id}/fund", post(fund_escrow))
        .route("/escrows/{id}/release", post(release_escrow))
        // Profile endpoint
        .route("/profiles/{address}", get(get_profile));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &crate::config::ApiConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
