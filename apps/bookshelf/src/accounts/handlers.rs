//! Axum route handlers for the Accounts API.

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::accounts::password::hash_password;
use crate::accounts::{authenticate, AccountState, SERVICE_NAME};
use crate::audit::{AuditEvent, Outcome};
use crate::auth::Credentials;
use crate::errors::AppError;
use crate::health;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() {
            return Err(AppError::UnprocessableEntity(
                "username cannot be empty".to_string(),
            ));
        }
        if self.password.is_empty() {
            return Err(AppError::UnprocessableEntity(
                "password cannot be empty".to_string(),
            ));
        }
        let valid_email = self
            .email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !valid_email {
            return Err(AppError::UnprocessableEntity(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AccountState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    request.validate()?;
    let password_hash = hash_password(&request.password)?;
    let user = state
        .store
        .create_user(request.username.trim(), &request.email, &password_hash)
        .await?;

    record(&state, user.id, "register", format!("Registered {}", user.username)).await;
    Ok(Json(json!({ "user_id": user.id })))
}

/// POST /api/v1/auth/login
///
/// Credentials come from the Basic `Authorization` header. Other services
/// call this to verify their callers.
pub async fn handle_login(
    State(state): State<AccountState>,
    headers: HeaderMap,
) -> Result<Json<LoginResponse>, AppError> {
    let credentials = Credentials::from_headers(&headers).ok_or_else(|| {
        AppError::Unauthorized("Missing or malformed Basic credentials".to_string())
    })?;
    let user = authenticate(state.store.as_ref(), &credentials).await?;

    record(&state, user.id, "login", format!("Logged in {}", user.username)).await;
    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        email: user.email,
    }))
}

/// POST /api/v1/logs
///
/// Central sink for audit events forwarded by the other services.
pub async fn handle_create_log(
    State(state): State<AccountState>,
    Json(event): Json<AuditEvent>,
) -> Result<Json<Value>, AppError> {
    let row = state.store.insert_log(&event).await?;
    Ok(Json(json!({ "log_id": row.id })))
}

/// GET /api/v1/health
pub async fn handle_health() -> Json<Value> {
    health::status(SERVICE_NAME)
}

// Own actions go to the tracing log and the audit table; a failed insert is
// only logged.
async fn record(state: &AccountState, user_id: i64, action: &str, details: String) {
    state
        .audit
        .record(user_id, action, Outcome::Success, Some(details.clone()));
    let event = AuditEvent {
        user_id,
        service: state.audit.service().to_string(),
        action: action.to_string(),
        status: Outcome::Success,
        details: Some(details),
    };
    if let Err(e) = state.store.insert_log(&event).await {
        warn!("Failed to store audit event '{action}': {e}");
    }
}
