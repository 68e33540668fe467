//! LLM client: the single point of entry for text generation calls.
//!
//! No other module may call the generation backend directly; summary
//! generation depends on the [`Summarizer`] trait, which `LlmClient`
//! implements. The backend speaks the Ollama `/api/generate` wire format.
//!
//! There is no retry loop here: a failed attempt is returned immediately and
//! classified so that callers can decide what to do with it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

use prompts::summary_prompt;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Network failure or timeout. Transient.
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    /// The backend rejected our credentials.
    #[error("Backend rejected credentials (status {status})")]
    BackendAuthFailure { status: u16 },

    /// The backend answered, but not with a usable completion.
    #[error("Backend protocol error (status {status}): {message}")]
    BackendProtocolError { status: u16, message: String },
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::BackendUnreachable(_))
    }

    fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            LlmError::BackendUnreachable(err.to_string())
        } else {
            LlmError::BackendProtocolError {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: err.to_string(),
            }
        }
    }
}

/// Turns raw content into generated summary text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, content: &str) -> Result<String, LlmError>;

    /// Reachability probe used by the health endpoint.
    async fn health(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
}

impl LlmClient {
    /// `client` should carry the process-wide outbound timeout.
    pub fn new(client: Client, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Makes a single generation call and returns the completion text.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            model: &self.settings.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: self.settings.max_tokens,
            },
        };

        let mut request = self
            .client
            .post(format!("{}/api/generate", self.settings.base_url))
            .json(&request_body);
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(LlmError::from_send)?;
        let status = response.status();
        let body = response.text().await.map_err(LlmError::from_send)?;

        parse_generation(status, &body)
    }

    /// Checks that the backend is reachable and answering.
    pub async fn ping(&self) -> Result<(), LlmError> {
        let mut request = self
            .client
            .get(format!("{}/api/tags", self.settings.base_url));
        if let Some(key) = &self.settings.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(LlmError::from_send)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_status(status, body))
        }
    }
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(&self, content: &str) -> Result<String, LlmError> {
        self.generate(&summary_prompt(content)).await
    }

    async fn health(&self) -> Result<(), LlmError> {
        self.ping().await
    }
}

fn classify_status(status: StatusCode, body: String) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::BackendAuthFailure {
            status: status.as_u16(),
        },
        _ => LlmError::BackendProtocolError {
            status: status.as_u16(),
            message: body,
        },
    }
}

/// Validates status and extracts the `response` field from a generation reply.
fn parse_generation(status: StatusCode, body: &str) -> Result<String, LlmError> {
    if !status.is_success() {
        warn!("LLM backend returned {}: {}", status, body);
        return Err(classify_status(status, body.to_string()));
    }

    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| LlmError::BackendProtocolError {
            status: status.as_u16(),
            message: format!("undecodable response ({e}): {body}"),
        })?;

    let text = parsed
        .response
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| LlmError::BackendProtocolError {
            status: status.as_u16(),
            message: format!("response missing generated text: {body}"),
        })?;

    debug!(
        "LLM call succeeded: output_tokens={}",
        parsed.eval_count.unwrap_or_default()
    );
    Ok(text)
}
