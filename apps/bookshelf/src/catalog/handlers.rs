//! Axum route handlers for the Catalog API.
//!
//! Every handler writes one audit event, success or failure.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Identity;
use crate::catalog::service::{create_book, update_book};
use crate::catalog::{CatalogState, SERVICE_NAME};
use crate::errors::AppError;
use crate::health;
use crate::models::book::{Book, BookPayload};

#[derive(Debug, Default, Deserialize)]
pub struct BookFilter {
    pub genre: Option<String>,
}

/// POST /api/v1/books
pub async fn handle_create_book(
    State(state): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<Book>, AppError> {
    let result = create_book(
        state.store.as_ref(),
        state.summaries.as_ref(),
        &identity,
        payload,
    )
    .await;
    state
        .audit
        .record_result(identity.user_id, "create_book", &result, |book| {
            format!("Created book: {}", book.title)
        });
    result.map(Json)
}

/// GET /api/v1/books?genre=
pub async fn handle_list_books(
    State(state): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    Query(filter): Query<BookFilter>,
) -> Result<Json<Vec<Book>>, AppError> {
    let genre = filter.genre.as_deref().filter(|g| !g.is_empty());
    let result = state.store.list(genre).await.map_err(AppError::from);
    state
        .audit
        .record_result(identity.user_id, "get_books", &result, |books| {
            let scope = genre.map(|g| format!(" with genre {g}")).unwrap_or_default();
            format!("Retrieved {} books{scope}", books.len())
        });
    result.map(Json)
}

/// GET /api/v1/books/:id
pub async fn handle_get_book(
    State(state): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    let result = state
        .store
        .get(id)
        .await
        .map_err(AppError::from)
        .and_then(|book| book.ok_or_else(|| not_found(id)));
    state.audit.record_result(
        identity.user_id,
        &format!("get_book_{id}"),
        &result,
        |book| format!("Retrieved book: {}", book.title),
    );
    result.map(Json)
}

/// PUT /api/v1/books/:id
pub async fn handle_update_book(
    State(state): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<Book>, AppError> {
    let result = update_book(
        state.store.as_ref(),
        state.summaries.as_ref(),
        &identity,
        id,
        payload,
    )
    .await;
    state.audit.record_result(
        identity.user_id,
        &format!("update_book_{id}"),
        &result,
        |book| format!("Updated book: {}", book.title),
    );
    result.map(Json)
}

/// DELETE /api/v1/books/:id
///
/// Summaries stored for the book are left in place.
pub async fn handle_delete_book(
    State(state): State<CatalogState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let result = match state.store.delete(id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(not_found(id)),
        Err(e) => Err(AppError::from(e)),
    };
    state.audit.record_result(
        identity.user_id,
        &format!("delete_book_{id}"),
        &result,
        |_| format!("Deleted book with ID: {id}"),
    );
    result?;
    Ok(Json(json!({
        "message": format!("Book with ID {id} has been deleted")
    })))
}

/// GET /api/v1/health
pub async fn handle_health() -> Json<Value> {
    health::status(SERVICE_NAME)
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book with ID {id} not found"))
}
