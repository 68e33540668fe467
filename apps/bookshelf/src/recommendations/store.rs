use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::StoreError;
use crate::models::preference::PreferenceRow;

pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS preferences (
        id          BIGSERIAL PRIMARY KEY,
        user_id     BIGINT      NOT NULL,
        genre       TEXT        NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_preferences_user ON preferences (user_id)",
];

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn insert(&self, user_id: i64, genre: &str) -> Result<PreferenceRow, StoreError>;

    /// In insertion order.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<PreferenceRow>, StoreError>;

    /// Deletes only if the preference belongs to `user_id`.
    async fn delete(&self, user_id: i64, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgPreferenceStore {
    pool: PgPool,
}

impl PgPreferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for PgPreferenceStore {
    async fn insert(&self, user_id: i64, genre: &str) -> Result<PreferenceRow, StoreError> {
        Ok(sqlx::query_as::<_, PreferenceRow>(
            "INSERT INTO preferences (user_id, genre) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(genre)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<PreferenceRow>, StoreError> {
        Ok(sqlx::query_as::<_, PreferenceRow>(
            "SELECT * FROM preferences WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete(&self, user_id: i64, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM preferences WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
