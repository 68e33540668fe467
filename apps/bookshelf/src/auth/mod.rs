//! Credential verification shared by every service.
//!
//! Services accept HTTP Basic credentials and hand them to a
//! [`CredentialVerifier`]. Downstream services delegate to the accounts
//! service through [`RemoteVerifier`]; the accounts service checks its own
//! user table.

pub mod middleware;

use std::fmt;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::AppError;
use crate::upstream::{read_json, UpstreamError};

pub use middleware::require_auth;

const ACCOUNTS_SERVICE: &str = "accounts service";

/// A username/password pair taken from a Basic `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parses `Authorization: Basic <base64(user:pass)>`. Returns `None` when
    /// the header is absent or malformed.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let encoded = value.strip_prefix("Basic ")?;
        let decoded = B64.decode(encoded.trim()).ok()?;
        let text = String::from_utf8(decoded).ok()?;
        let (username, password) = text.split_once(':')?;
        if username.is_empty() {
            return None;
        }
        Some(Self::new(username, password))
    }

    /// Encodes back into a header value, used when forwarding to other services.
    pub fn to_header_value(&self) -> String {
        format!(
            "Basic {}",
            B64.encode(format!("{}:{}", self.username, self.password))
        )
    }
}

/// The verified caller, handed to handlers through request extensions.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub credentials: Credentials,
}

/// Checks a username/password pair and yields the user id.
///
/// Returns `AppError::Unauthorized` for bad credentials; any other error means
/// the check itself could not be performed.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credentials: &Credentials) -> Result<i64, AppError>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    user_id: i64,
}

/// Verifies credentials by forwarding them to the accounts service login endpoint.
#[derive(Clone)]
pub struct RemoteVerifier {
    client: Client,
    login_url: String,
}

impl RemoteVerifier {
    pub fn new(client: Client, shared_service_url: &str) -> Self {
        Self {
            client,
            login_url: format!("{shared_service_url}/api/v1/auth/login"),
        }
    }
}

#[async_trait]
impl CredentialVerifier for RemoteVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<i64, AppError> {
        let response = self
            .client
            .post(&self.login_url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| UpstreamError::from_send(ACCOUNTS_SERVICE, e))?;

        match read_json::<LoginResponse>(ACCOUNTS_SERVICE, response).await {
            Ok(login) => Ok(login.user_id),
            Err(UpstreamError::Unauthorized { .. } | UpstreamError::NotFound { .. }) => {
                Err(AppError::Unauthorized("Invalid credentials".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
