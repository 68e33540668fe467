use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::auth::Credentials;
use crate::models::summary::SummaryView;
use crate::upstream::{read_json, UpstreamError};

const SUMMARIES_SERVICE: &str = "summaries service";

/// Access to the summaries service from other services.
///
/// Calls are made on behalf of the caller, whose credentials are forwarded so
/// that the summary is stored under their user id.
#[async_trait]
pub trait SummaryGateway: Send + Sync {
    async fn get_or_create(
        &self,
        credentials: &Credentials,
        subject_id: i64,
        content: &str,
    ) -> Result<SummaryView, UpstreamError>;
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    subject_id: i64,
    content: &'a str,
}

#[derive(Clone)]
pub struct HttpSummaryGateway {
    client: Client,
    url: String,
}

impl HttpSummaryGateway {
    pub fn new(client: Client, summary_service_url: &str) -> Self {
        Self {
            client,
            url: format!("{summary_service_url}/api/v1/generate-summary"),
        }
    }
}

#[async_trait]
impl SummaryGateway for HttpSummaryGateway {
    async fn get_or_create(
        &self,
        credentials: &Credentials,
        subject_id: i64,
        content: &str,
    ) -> Result<SummaryView, UpstreamError> {
        let response = self
            .client
            .post(&self.url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .json(&GenerateBody {
                subject_id,
                content,
            })
            .send()
            .await
            .map_err(|e| UpstreamError::from_send(SUMMARIES_SERVICE, e))?;

        read_json(SUMMARIES_SERVICE, response).await
    }
}
