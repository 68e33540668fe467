use async_trait::async_trait;
use sqlx::PgPool;

use crate::audit::AuditEvent;
use crate::db::StoreError;
use crate::models::account::{AuditLogRow, UserRow};

pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id             BIGSERIAL PRIMARY KEY,
        username       TEXT        NOT NULL,
        email          TEXT        NOT NULL,
        password_hash  TEXT        NOT NULL,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id          BIGSERIAL PRIMARY KEY,
        user_id     BIGINT      NOT NULL,
        service     TEXT        NOT NULL,
        action      TEXT        NOT NULL,
        status      TEXT        NOT NULL,
        details     TEXT,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_user ON audit_logs (user_id)",
];

/// Users and the central audit trail.
///
/// `create_user` fails with [`StoreError::Conflict`] on a duplicate username
/// or email.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError>;

    async fn insert_log(&self, event: &AuditEvent) -> Result<AuditLogRow, StoreError>;
}

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow, StoreError> {
        Ok(sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn insert_log(&self, event: &AuditEvent) -> Result<AuditLogRow, StoreError> {
        Ok(sqlx::query_as::<_, AuditLogRow>(
            r#"
            INSERT INTO audit_logs (user_id, service, action, status, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(event.user_id)
        .bind(&event.service)
        .bind(&event.action)
        .bind(event.status.as_str())
        .bind(&event.details)
        .fetch_one(&self.pool)
        .await?)
    }
}
