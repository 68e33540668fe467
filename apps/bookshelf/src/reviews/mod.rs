//! Reviews service: ratings and comments per book, plus an LLM digest of
//! all reviews of a book.

pub mod handlers;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::audit::AuditLog;
use crate::auth::{require_auth, CredentialVerifier};
use crate::catalog::client::BookCatalog;
use crate::summaries::client::SummaryGateway;
use store::ReviewStore;

pub const SERVICE_NAME: &str = "reviews";

#[derive(Clone)]
pub struct ReviewState {
    pub store: Arc<dyn ReviewStore>,
    pub catalog: Arc<dyn BookCatalog>,
    pub summaries: Arc<dyn SummaryGateway>,
    pub audit: AuditLog,
}

pub fn router(state: ReviewState, verifier: Arc<dyn CredentialVerifier>) -> Router {
    Router::new()
        .route(
            "/api/v1/reviews",
            post(handlers::handle_create_review).get(handlers::handle_list_reviews),
        )
        .route(
            "/api/v1/reviews/:id",
            get(handlers::handle_get_review)
                .put(handlers::handle_update_review)
                .delete(handlers::handle_delete_review),
        )
        .route(
            "/api/v1/books/:book_id/reviews/summary",
            get(handlers::handle_reviews_summary),
        )
        .route_layer(from_fn_with_state(verifier, require_auth))
        .route("/api/v1/health", get(handlers::handle_health))
        .with_state(state)
}
