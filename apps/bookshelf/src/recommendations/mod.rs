//! Recommendations service: per-user genre preferences and the books they
//! point to.

pub mod handlers;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get},
    Router,
};

use crate::audit::AuditLog;
use crate::auth::{require_auth, CredentialVerifier};
use crate::catalog::client::BookCatalog;
use store::PreferenceStore;

pub const SERVICE_NAME: &str = "recommendations";

#[derive(Clone)]
pub struct RecommendationState {
    pub store: Arc<dyn PreferenceStore>,
    pub catalog: Arc<dyn BookCatalog>,
    pub audit: AuditLog,
}

pub fn router(state: RecommendationState, verifier: Arc<dyn CredentialVerifier>) -> Router {
    Router::new()
        .route(
            "/api/v1/preferences",
            get(handlers::handle_list_preferences).post(handlers::handle_create_preference),
        )
        .route(
            "/api/v1/preferences/:id",
            delete(handlers::handle_delete_preference),
        )
        .route(
            "/api/v1/recommendations",
            get(handlers::handle_recommendations),
        )
        .route_layer(from_fn_with_state(verifier, require_auth))
        .route("/api/v1/health", get(handlers::handle_health))
        .with_state(state)
}
