//! Accounts service: user registration, credential checks for the other
//! services, and the central audit log.

pub mod handlers;
pub mod password;
pub mod store;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::audit::AuditLog;
use crate::auth::Credentials;
use crate::errors::AppError;
use crate::models::account::UserRow;
use password::verify_password;
use store::AccountStore;

pub const SERVICE_NAME: &str = "accounts";

#[derive(Clone)]
pub struct AccountState {
    pub store: Arc<dyn AccountStore>,
    pub audit: AuditLog,
}

/// Looks the user up and checks the password. Unknown users and wrong
/// passwords are indistinguishable to the caller.
pub async fn authenticate(
    store: &dyn AccountStore,
    credentials: &Credentials,
) -> Result<UserRow, AppError> {
    let user = store.find_by_username(&credentials.username).await?;
    match user {
        Some(user) if verify_password(&credentials.password, &user.password_hash) => Ok(user),
        _ => Err(AppError::Unauthorized("Invalid credentials".to_string())),
    }
}

pub fn router(state: AccountState) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(handlers::handle_register))
        .route("/api/v1/auth/login", post(handlers::handle_login))
        .route("/api/v1/logs", post(handlers::handle_create_log))
        .route("/api/v1/health", get(handlers::handle_health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{body_json, MemoryAccountStore};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MemoryAccountStore>) {
        let store = Arc::new(MemoryAccountStore::default());
        let state = AccountState {
            store: store.clone(),
            audit: AuditLog::local(SERVICE_NAME),
        };
        (router(state), store)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn login(username: &str, password: &str) -> Request<Body> {
        Request::post("/api/v1/auth/login")
            .header(
                header::AUTHORIZATION,
                Credentials::new(username, password).to_header_value(),
            )
            .body(Body::empty())
            .unwrap()
    }

    async fn register(app: &Router, username: &str, email: &str) -> axum::response::Response {
        app.clone()
            .oneshot(post_json(
                "/api/v1/auth/register",
                json!({"username": username, "email": email, "password": "pw"}),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (app, store) = app();
        let response = register(&app, "reader", "reader@example.com").await;
        assert_eq!(response.status(), StatusCode::OK);
        let user_id = body_json(response).await["user_id"].as_i64().unwrap();

        let response = app.oneshot(login("reader", "pw")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user_id"], user_id);
        assert_eq!(body["username"], "reader");
        assert_eq!(body["email"], "reader@example.com");
        assert!(body.get("password_hash").is_none());

        let actions: Vec<String> = store.logs().into_iter().map(|l| l.action).collect();
        assert_eq!(actions, vec!["register".to_string(), "login".to_string()]);
    }

    #[tokio::test]
    async fn test_wrong_password_is_401() {
        let (app, _store) = app();
        register(&app, "reader", "reader@example.com").await;

        let response = app.oneshot(login("reader", "nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_user_is_401() {
        let (app, _store) = app();
        let response = app.oneshot(login("ghost", "pw")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_409() {
        let (app, _store) = app();
        register(&app, "reader", "reader@example.com").await;

        let response = register(&app, "reader", "other@example.com").await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_email_is_422() {
        let (app, _store) = app();
        let response = register(&app, "reader", "no-at-sign").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_forwarded_log_is_stored() {
        let (app, store) = app();
        let response = app
            .oneshot(post_json(
                "/api/v1/logs",
                json!({
                    "user_id": 7,
                    "service": "catalog",
                    "action": "create_book",
                    "status": "success",
                    "details": "Created book: Dune"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["log_id"].is_i64());
        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].service, "catalog");
        assert_eq!(logs[0].status, "success");
    }
}
