//! Axum route handlers for the Summaries API.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::health;
use crate::models::summary::SummaryView;
use crate::summaries::cache::{get_or_create_summary, SummaryRequest, SummarySource};
use crate::summaries::{SummaryState, SERVICE_NAME};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    #[serde(default, alias = "refresh")]
    pub force_refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateSummaryRequest {
    #[serde(alias = "book_id")]
    pub subject_id: i64,
    pub content: String,
}

/// POST /api/v1/generate-summary
///
/// Returns the caller's stored summary for the subject, generating it first
/// when none exists or when `force_refresh` is set.
pub async fn handle_generate_summary(
    State(state): State<SummaryState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<GenerateQuery>,
    Json(request): Json<GenerateSummaryRequest>,
) -> Result<Json<SummaryView>, AppError> {
    let subject_id = request.subject_id;
    let result = get_or_create_summary(
        state.store.as_ref(),
        state.summarizer.as_ref(),
        SummaryRequest {
            subject_id,
            requester_id: identity.user_id,
            content: request.content,
            force_refresh: query.force_refresh,
        },
    )
    .await
    .map_err(AppError::from);

    let action = match &result {
        Ok(resolved) => match resolved.source {
            SummarySource::Cached | SummarySource::ConcurrentWinner => "get_summary",
            SummarySource::Created => "create_summary",
            SummarySource::Refreshed => "update_summary",
        },
        Err(_) => "generate_summary",
    };
    state
        .audit
        .record_result(identity.user_id, action, &result, |resolved| {
            match resolved.source {
                SummarySource::Cached | SummarySource::ConcurrentWinner => {
                    format!("Retrieved existing summary for book {subject_id}")
                }
                SummarySource::Created => format!("Created new summary for book {subject_id}"),
                SummarySource::Refreshed => format!("Updated summary for book {subject_id}"),
            }
        });
    result.map(|resolved| Json(resolved.record.into()))
}

/// GET /api/v1/summaries/:subject_id
pub async fn handle_get_summary(
    State(state): State<SummaryState>,
    Extension(identity): Extension<Identity>,
    Path(subject_id): Path<i64>,
) -> Result<Json<SummaryView>, AppError> {
    let result = state
        .store
        .find(subject_id, identity.user_id)
        .await
        .map_err(AppError::from)
        .and_then(|record| {
            record.ok_or_else(|| {
                AppError::NotFound(format!("Summary for book {subject_id} not found"))
            })
        });
    state
        .audit
        .record_result(identity.user_id, "get_summary", &result, |_| {
            format!("Retrieved summary for book {subject_id}")
        });
    result.map(|record| Json(record.into()))
}

/// GET /api/v1/health
///
/// Reports unavailable when the summarization backend cannot be reached.
pub async fn handle_health(State(state): State<SummaryState>) -> Result<Json<Value>, AppError> {
    state.summarizer.health().await.map_err(|e| {
        tracing::warn!("Health check failed: {e}");
        AppError::UpstreamUnavailable("Summarization backend is unavailable".to_string())
    })?;
    Ok(health::status(SERVICE_NAME))
}
