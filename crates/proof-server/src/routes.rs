//! API route definitions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

/// Create API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Notes
        .route("/api/note/generate", post(handlers::generate_note))
        .route("/api/note/parse", post(handlers::parse_note))
        // Pool mutations
        .route("/api/deposit", post(handlers::deposit))
        .route("/api/prove/withdraw", post(handlers::prove_withdraw))
        .route("/api/withdraw", post(handlers::withdraw))
        // Pre-flight queries
        .route("/api/root", get(handlers::current_root))
        .route("/api/roots/:root", get(handlers::root_status))
        .route("/api/nullifiers/:hash", get(handlers::nullifier_status))
}
