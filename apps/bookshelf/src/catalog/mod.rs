//! Catalog service: book CRUD with generated summaries.

pub mod client;
pub mod handlers;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::audit::AuditLog;
use crate::auth::{require_auth, CredentialVerifier};
use crate::summaries::client::SummaryGateway;
use store::BookStore;

pub const SERVICE_NAME: &str = "catalog";

#[derive(Clone)]
pub struct CatalogState {
    pub store: Arc<dyn BookStore>,
    pub summaries: Arc<dyn SummaryGateway>,
    pub audit: AuditLog,
}

pub fn router(state: CatalogState, verifier: Arc<dyn CredentialVerifier>) -> Router {
    Router::new()
        .route(
            "/api/v1/books",
            get(handlers::handle_list_books).post(handlers::handle_create_book),
        )
        .route(
            "/api/v1/books/:id",
            get(handlers::handle_get_book)
                .put(handlers::handle_update_book)
                .delete(handlers::handle_delete_book),
        )
        .route_layer(from_fn_with_state(verifier, require_auth))
        .route("/api/v1/health", get(handlers::handle_health))
        .with_state(state)
}
