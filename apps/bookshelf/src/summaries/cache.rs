//! Read-through cache in front of the summarization backend.
//!
//! A summary is stored once per (subject, requester). A stored summary is
//! reused unless the caller forces a refresh; otherwise the backend is called
//! and the result is inserted or updated in place.
//!
//! The backend call and the write are not one transaction. A backend success
//! followed by a failed write leaves nothing behind and surfaces as
//! [`SummaryError::Persistence`], never as a backend error.

use thiserror::Error;
use tracing::{debug, info};

use crate::db::StoreError;
use crate::errors::AppError;
use crate::llm_client::{LlmError, Summarizer};
use crate::models::summary::{NewSummary, SummaryRecord};
use crate::summaries::store::SummaryStore;

#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub subject_id: i64,
    pub requester_id: i64,
    pub content: String,
    pub force_refresh: bool,
}

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Backend(#[from] LlmError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// How a summary was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    /// Stored record returned untouched; no backend call.
    Cached,
    /// First generation for the pair.
    Created,
    /// Existing record regenerated in place.
    Refreshed,
    /// Lost a concurrent first-time insert; the winner's record is returned.
    ConcurrentWinner,
}

#[derive(Debug, Clone)]
pub struct ResolvedSummary {
    pub record: SummaryRecord,
    pub source: SummarySource,
}

pub async fn get_or_create_summary(
    store: &dyn SummaryStore,
    summarizer: &dyn Summarizer,
    request: SummaryRequest,
) -> Result<ResolvedSummary, SummaryError> {
    let SummaryRequest {
        subject_id,
        requester_id,
        content,
        force_refresh,
    } = request;

    if content.trim().is_empty() {
        return Err(SummaryError::Validation(
            "content cannot be empty".to_string(),
        ));
    }

    // 1. Look up the pair
    let existing = store.find(subject_id, requester_id).await?;

    // 2. Cache hit
    if let Some(record) = existing.as_ref().filter(|_| !force_refresh) {
        debug!("Summary cache hit for subject {subject_id}, requester {requester_id}");
        return Ok(ResolvedSummary {
            record: record.clone(),
            source: SummarySource::Cached,
        });
    }

    // 3. Single backend attempt
    let summary_text = summarizer.summarize(&content).await?;

    // 4. Refresh in place
    if let Some(record) = existing {
        let record = store.update(record.id, &content, &summary_text).await?;
        info!("Refreshed summary {} for subject {subject_id}", record.id);
        return Ok(ResolvedSummary {
            record,
            source: SummarySource::Refreshed,
        });
    }

    // 5. First generation for the pair
    let new_summary = NewSummary {
        subject_id,
        requester_id,
        source_content: content,
        summary_text,
    };
    match store.insert(new_summary).await {
        Ok(record) => {
            info!("Created summary {} for subject {subject_id}", record.id);
            Ok(ResolvedSummary {
                record,
                source: SummarySource::Created,
            })
        }
        Err(StoreError::Conflict(constraint)) => {
            // Another request inserted the pair after our lookup; its record wins.
            let winner = store.find(subject_id, requester_id).await?.ok_or_else(|| {
                SummaryError::Persistence(StoreError::Conflict(constraint))
            })?;
            info!(
                "Concurrent summary insert for subject {subject_id}, returning record {}",
                winner.id
            );
            Ok(ResolvedSummary {
                record: winner,
                source: SummarySource::ConcurrentWinner,
            })
        }
        Err(e) => Err(e.into()),
    }
}

impl From<SummaryError> for AppError {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::Validation(msg) => AppError::UnprocessableEntity(msg),
            SummaryError::Backend(e) if e.is_retryable() => {
                tracing::warn!("Summarization backend unavailable: {e}");
                AppError::UpstreamUnavailable("Summarization backend is unavailable".to_string())
            }
            SummaryError::Backend(LlmError::BackendAuthFailure { status }) => {
                tracing::error!("Summarization backend rejected credentials (status {status})");
                AppError::Unauthorized(
                    "Summarization backend rejected the service credentials".to_string(),
                )
            }
            SummaryError::Backend(e) => AppError::UpstreamProtocol(e.to_string()),
            SummaryError::Persistence(e) => e.into(),
        }
    }
}
