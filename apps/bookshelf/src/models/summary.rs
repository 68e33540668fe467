use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One generated summary for one (subject, requester) pair.
/// At most one row exists per pair (`UNIQUE (subject_id, requester_id)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SummaryRecord {
    pub id: i64,
    pub subject_id: i64,
    pub requester_id: i64,
    pub source_content: String,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a summary is first persisted; id and timestamps are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSummary {
    pub subject_id: i64,
    pub requester_id: i64,
    pub source_content: String,
    pub summary_text: String,
}

/// Wire shape of a summary as returned by the summaries service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryView {
    pub id: i64,
    pub subject_id: i64,
    pub content: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SummaryRecord> for SummaryView {
    fn from(record: SummaryRecord) -> Self {
        Self {
            id: record.id,
            subject_id: record.subject_id,
            content: record.source_content,
            summary: record.summary_text,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
