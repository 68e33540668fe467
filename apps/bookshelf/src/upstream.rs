//! Shared plumbing for calls from one service to another.
//!
//! Every outbound request goes through a client built by [`build_http_client`]
//! so it carries a bounded timeout, and every failure is classified into
//! [`UpstreamError`] the same way regardless of which collaborator was called.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::errors::AppError;

/// Builds the process-wide HTTP client used for all outbound calls.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} is unavailable: {detail}")]
    Unavailable { service: &'static str, detail: String },

    #[error("Authentication failed with {service}")]
    Unauthorized { service: &'static str },

    #[error("{service} returned 404: {detail}")]
    NotFound { service: &'static str, detail: String },

    #[error("{service} rejected the request (status {status}): {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} protocol error: {detail}")]
    Protocol { service: &'static str, detail: String },
}

impl UpstreamError {
    /// Classifies a transport-level failure from `reqwest`.
    pub fn from_send(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            UpstreamError::Unavailable {
                service,
                detail: err.to_string(),
            }
        } else {
            UpstreamError::Protocol {
                service,
                detail: err.to_string(),
            }
        }
    }

    /// Classifies a non-success status code.
    pub fn from_status(service: &'static str, status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                UpstreamError::Unauthorized { service }
            }
            StatusCode::NOT_FOUND => UpstreamError::NotFound {
                service,
                detail: body,
            },
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                UpstreamError::Unavailable {
                    service,
                    detail: format!("status {}: {}", status.as_u16(), body),
                }
            }
            s if s.is_client_error() => UpstreamError::Rejected {
                service,
                status: s.as_u16(),
                body,
            },
            s => UpstreamError::Protocol {
                service,
                detail: format!("status {}: {}", s.as_u16(), body),
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, UpstreamError::Unavailable { .. })
    }

    pub fn service(&self) -> &'static str {
        match self {
            UpstreamError::Unavailable { service, .. }
            | UpstreamError::Unauthorized { service }
            | UpstreamError::NotFound { service, .. }
            | UpstreamError::Rejected { service, .. }
            | UpstreamError::Protocol { service, .. } => service,
        }
    }
}

/// Passes a 2xx response through, otherwise reads the body and classifies it.
pub async fn expect_success(
    service: &'static str,
    response: Response,
) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::from_status(service, status, body))
}

/// Checks the status and decodes a JSON body.
pub async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, UpstreamError> {
    let response = expect_success(service, response).await?;
    let body = response
        .text()
        .await
        .map_err(|e| UpstreamError::from_send(service, e))?;
    serde_json::from_str(&body).map_err(|e| UpstreamError::Protocol {
        service,
        detail: format!("undecodable body ({e}): {body}"),
    })
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            err if err.is_retryable() => {
                tracing::warn!("Transient upstream failure: {err}");
                AppError::UpstreamUnavailable(format!("{} is unavailable", err.service()))
            }
            UpstreamError::Unauthorized { service } => {
                AppError::Unauthorized(format!("Authentication failed with {service}"))
            }
            UpstreamError::NotFound { service, .. } => {
                AppError::NotFound(format!("Resource not found in {service}"))
            }
            UpstreamError::Rejected {
                service,
                status: 422,
                body,
            } => AppError::UnprocessableEntity(format!("{service} rejected the input: {body}")),
            other => AppError::UpstreamProtocol(other.to_string()),
        }
    }
}
