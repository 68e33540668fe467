//! Axum route handlers for the Recommendations API.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::errors::AppError;
use crate::health;
use crate::models::preference::{PreferencePayload, PreferenceRow};
use crate::recommendations::service::{recommend, BookRecommendation};
use crate::recommendations::{RecommendationState, SERVICE_NAME};

/// POST /api/v1/preferences
pub async fn handle_create_preference(
    State(state): State<RecommendationState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<PreferencePayload>,
) -> Result<Json<PreferenceRow>, AppError> {
    let result = match payload.normalized() {
        Ok(payload) => state
            .store
            .insert(identity.user_id, &payload.genre)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e),
    };
    state
        .audit
        .record_result(identity.user_id, "create_preference", &result, |preference| {
            format!("Created preference for genre {}", preference.genre)
        });
    result.map(Json)
}

/// GET /api/v1/preferences
pub async fn handle_list_preferences(
    State(state): State<RecommendationState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<PreferenceRow>>, AppError> {
    let result = state
        .store
        .list_for_user(identity.user_id)
        .await
        .map_err(AppError::from);
    state
        .audit
        .record_result(identity.user_id, "get_preferences", &result, |preferences| {
            format!("Retrieved {} preferences", preferences.len())
        });
    result.map(Json)
}

/// DELETE /api/v1/preferences/:id
pub async fn handle_delete_preference(
    State(state): State<RecommendationState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let result = match state.store.delete(identity.user_id, id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::NotFound(format!(
            "Preference with ID {id} not found"
        ))),
        Err(e) => Err(AppError::from(e)),
    };
    state
        .audit
        .record_result(identity.user_id, "delete_preference", &result, |_| {
            format!("Deleted preference {id}")
        });
    result?;
    Ok(Json(json!({
        "message": format!("Preference with ID {id} has been deleted")
    })))
}

/// GET /api/v1/recommendations
pub async fn handle_recommendations(
    State(state): State<RecommendationState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<BookRecommendation>>, AppError> {
    let result = match state.store.list_for_user(identity.user_id).await {
        Ok(preferences) => recommend(state.catalog.as_ref(), &identity, &preferences).await,
        Err(e) => Err(AppError::from(e)),
    };
    state
        .audit
        .record_result(identity.user_id, "get_recommendations", &result, |books| {
            format!("Retrieved {} unique recommendations", books.len())
        });
    result.map(Json)
}

/// GET /api/v1/health
pub async fn handle_health() -> Json<Value> {
    health::status(SERVICE_NAME)
}
