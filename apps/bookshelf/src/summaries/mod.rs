//! Summaries service: per-user cached summaries produced by the LLM backend.

pub mod cache;
pub mod client;
pub mod handlers;
pub mod store;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::audit::AuditLog;
use crate::auth::{require_auth, CredentialVerifier};
use crate::llm_client::Summarizer;
use store::SummaryStore;

pub const SERVICE_NAME: &str = "summaries";

#[derive(Clone)]
pub struct SummaryState {
    pub store: Arc<dyn SummaryStore>,
    pub summarizer: Arc<dyn Summarizer>,
    pub audit: AuditLog,
}

pub fn router(state: SummaryState, verifier: Arc<dyn CredentialVerifier>) -> Router {
    Router::new()
        .route(
            "/api/v1/generate-summary",
            post(handlers::handle_generate_summary),
        )
        .route(
            "/api/v1/summaries/:subject_id",
            get(handlers::handle_get_summary),
        )
        .route_layer(from_fn_with_state(verifier, require_auth))
        .route("/api/v1/health", get(handlers::handle_health))
        .with_state(state)
}
