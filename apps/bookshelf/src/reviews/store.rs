use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::StoreError;
use crate::models::review::{ReviewPayload, ReviewRow};

pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id          BIGSERIAL PRIMARY KEY,
        book_id     BIGINT           NOT NULL,
        user_id     BIGINT           NOT NULL,
        rating      DOUBLE PRECISION NOT NULL,
        comment     TEXT,
        created_at  TIMESTAMPTZ      NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ      NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reviews_book ON reviews (book_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews (user_id)",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewFilter {
    pub book_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(
        &self,
        book_id: i64,
        user_id: i64,
        review: &ReviewPayload,
    ) -> Result<ReviewRow, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<ReviewRow>, StoreError>;

    /// Ordered by id.
    async fn list(&self, filter: ReviewFilter) -> Result<Vec<ReviewRow>, StoreError>;

    async fn update(
        &self,
        id: i64,
        review: &ReviewPayload,
    ) -> Result<Option<ReviewRow>, StoreError>;

    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn insert(
        &self,
        book_id: i64,
        user_id: i64,
        review: &ReviewPayload,
    ) -> Result<ReviewRow, StoreError> {
        Ok(sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (book_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get(&self, id: i64) -> Result<Option<ReviewRow>, StoreError> {
        Ok(sqlx::query_as::<_, ReviewRow>("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self, filter: ReviewFilter) -> Result<Vec<ReviewRow>, StoreError> {
        Ok(sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT * FROM reviews
            WHERE ($1::BIGINT IS NULL OR book_id = $1)
              AND ($2::BIGINT IS NULL OR user_id = $2)
            ORDER BY id
            "#,
        )
        .bind(filter.book_id)
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update(
        &self,
        id: i64,
        review: &ReviewPayload,
    ) -> Result<Option<ReviewRow>, StoreError> {
        Ok(sqlx::query_as::<_, ReviewRow>(
            r#"
            UPDATE reviews
            SET rating = $1, comment = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(review.rating)
        .bind(&review.comment)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
