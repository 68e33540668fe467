use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::StoreError;
use crate::models::summary::{NewSummary, SummaryRecord};

pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS book_summaries (
        id              BIGSERIAL PRIMARY KEY,
        subject_id      BIGINT      NOT NULL,
        requester_id    BIGINT      NOT NULL,
        source_content  TEXT        NOT NULL,
        summary_text    TEXT        NOT NULL,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT book_summaries_subject_requester_key UNIQUE (subject_id, requester_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_book_summaries_requester ON book_summaries (requester_id)",
];

/// Persistence for summary records.
///
/// `insert` must fail with [`StoreError::Conflict`] when a record already
/// exists for the same (subject, requester) pair.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn find(
        &self,
        subject_id: i64,
        requester_id: i64,
    ) -> Result<Option<SummaryRecord>, StoreError>;

    async fn insert(&self, summary: NewSummary) -> Result<SummaryRecord, StoreError>;

    /// Replaces content and summary in place and bumps `updated_at`.
    async fn update(
        &self,
        id: i64,
        source_content: &str,
        summary_text: &str,
    ) -> Result<SummaryRecord, StoreError>;
}

#[derive(Clone)]
pub struct PgSummaryStore {
    pool: PgPool,
}

impl PgSummaryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SummaryStore for PgSummaryStore {
    async fn find(
        &self,
        subject_id: i64,
        requester_id: i64,
    ) -> Result<Option<SummaryRecord>, StoreError> {
        Ok(sqlx::query_as::<_, SummaryRecord>(
            "SELECT * FROM book_summaries WHERE subject_id = $1 AND requester_id = $2",
        )
        .bind(subject_id)
        .bind(requester_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert(&self, summary: NewSummary) -> Result<SummaryRecord, StoreError> {
        Ok(sqlx::query_as::<_, SummaryRecord>(
            r#"
            INSERT INTO book_summaries (subject_id, requester_id, source_content, summary_text)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(summary.subject_id)
        .bind(summary.requester_id)
        .bind(&summary.source_content)
        .bind(&summary.summary_text)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update(
        &self,
        id: i64,
        source_content: &str,
        summary_text: &str,
    ) -> Result<SummaryRecord, StoreError> {
        Ok(sqlx::query_as::<_, SummaryRecord>(
            r#"
            UPDATE book_summaries
            SET source_content = $1, summary_text = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(source_content)
        .bind(summary_text)
        .bind(id)
        .fetch_one(&self.pool)
        .await?)
    }
}
