use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLogRow {
    pub id: i64,
    pub user_id: i64,
    pub service: String,
    pub action: String,
    pub status: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}
