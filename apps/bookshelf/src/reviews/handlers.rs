//! Axum route handlers for the Reviews API.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::errors::AppError;
use crate::health;
use crate::models::review::{ReviewPayload, ReviewRow};
use crate::reviews::service::{self, ReviewsSummary};
use crate::reviews::store::ReviewFilter;
use crate::reviews::{ReviewState, SERVICE_NAME};

#[derive(Debug, Deserialize)]
pub struct CreateReviewQuery {
    pub book_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewListQuery {
    pub book_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// POST /api/v1/reviews?book_id=
pub async fn handle_create_review(
    State(state): State<ReviewState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<CreateReviewQuery>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<ReviewRow>, AppError> {
    let book_id = query.book_id;
    let result = service::create_review(
        state.store.as_ref(),
        state.catalog.as_ref(),
        &identity,
        book_id,
        payload,
    )
    .await;
    state
        .audit
        .record_result(identity.user_id, "create_review", &result, |review| {
            format!("Created review {} for book {book_id}", review.id)
        });
    result.map(Json)
}

/// GET /api/v1/reviews?book_id=&user_id=
pub async fn handle_list_reviews(
    State(state): State<ReviewState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<Vec<ReviewRow>>, AppError> {
    let result = state
        .store
        .list(ReviewFilter {
            book_id: query.book_id,
            user_id: query.user_id,
        })
        .await
        .map_err(AppError::from);
    state
        .audit
        .record_result(identity.user_id, "get_reviews", &result, |reviews| {
            format!("Retrieved {} reviews", reviews.len())
        });
    result.map(Json)
}

/// GET /api/v1/reviews/:id
pub async fn handle_get_review(
    State(state): State<ReviewState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<ReviewRow>, AppError> {
    let result = service::get_review(state.store.as_ref(), id).await;
    state.audit.record_result(
        identity.user_id,
        &format!("get_review_{id}"),
        &result,
        |_| format!("Retrieved review {id}"),
    );
    result.map(Json)
}

/// PUT /api/v1/reviews/:id
pub async fn handle_update_review(
    State(state): State<ReviewState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<ReviewRow>, AppError> {
    let result = service::update_review(state.store.as_ref(), &identity, id, payload).await;
    state.audit.record_result(
        identity.user_id,
        &format!("update_review_{id}"),
        &result,
        |_| format!("Updated review {id}"),
    );
    result.map(Json)
}

/// DELETE /api/v1/reviews/:id
pub async fn handle_delete_review(
    State(state): State<ReviewState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let result = service::delete_review(state.store.as_ref(), &identity, id).await;
    state.audit.record_result(
        identity.user_id,
        &format!("delete_review_{id}"),
        &result,
        |_| format!("Deleted review {id}"),
    );
    result?;
    Ok(Json(json!({
        "message": format!("Review with ID {id} has been deleted")
    })))
}

/// GET /api/v1/books/:book_id/reviews/summary
pub async fn handle_reviews_summary(
    State(state): State<ReviewState>,
    Extension(identity): Extension<Identity>,
    Path(book_id): Path<i64>,
) -> Result<Json<ReviewsSummary>, AppError> {
    let result = service::reviews_summary(
        state.store.as_ref(),
        state.summaries.as_ref(),
        &identity,
        book_id,
    )
    .await;
    state.audit.record_result(
        identity.user_id,
        &format!("get_book_reviews_summary_{book_id}"),
        &result,
        |summary| {
            format!(
                "Generated reviews summary for book {book_id} from {} reviews",
                summary.total_reviews
            )
        },
    );
    result.map(Json)
}

/// GET /api/v1/health
pub async fn handle_health() -> Json<Value> {
    health::status(SERVICE_NAME)
}
