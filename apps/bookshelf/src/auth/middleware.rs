use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::auth::{CredentialVerifier, Credentials, Identity};
use crate::errors::AppError;

/// Middleware that verifies Basic credentials and inserts the caller's
/// [`Identity`] into request extensions. Handlers behind it take
/// `Extension<Identity>`.
pub async fn require_auth(
    State(verifier): State<Arc<dyn CredentialVerifier>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(credentials) = Credentials::from_headers(req.headers()) else {
        return challenge("Missing or malformed Basic credentials");
    };

    match verifier.verify(&credentials).await {
        Ok(user_id) => {
            debug!("Authenticated user {user_id} ({})", credentials.username);
            req.extensions_mut().insert(Identity {
                user_id,
                credentials,
            });
            next.run(req).await
        }
        Err(AppError::Unauthorized(msg)) => challenge(&msg),
        Err(e) => e.into_response(),
    }
}

fn challenge(message: &str) -> Response {
    let mut response = AppError::Unauthorized(message.to_string()).into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"bookshelf\""),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticVerifier;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let verifier: Arc<dyn CredentialVerifier> =
            Arc::new(StaticVerifier::new().with_user("reader", "pw", 7));
        Router::new()
            .route(
                "/whoami",
                get(|Extension(identity): Extension<Identity>| async move {
                    identity.user_id.to_string()
                }),
            )
            .layer(from_fn_with_state(verifier, require_auth))
    }

    #[tokio::test]
    async fn test_valid_credentials_reach_handler() {
        let response = app()
            .oneshot(
                HttpRequest::get("/whoami")
                    .header(
                        header::AUTHORIZATION,
                        Credentials::new("reader", "pw").to_header_value(),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"7");
    }

    #[tokio::test]
    async fn test_missing_header_is_challenged() {
        let response = app()
            .oneshot(HttpRequest::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let response = app()
            .oneshot(
                HttpRequest::get("/whoami")
                    .header(
                        header::AUTHORIZATION,
                        Credentials::new("reader", "nope").to_header_value(),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
