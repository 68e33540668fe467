use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PreferenceRow {
    pub id: i64,
    pub user_id: i64,
    pub genre: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferencePayload {
    pub genre: String,
}

impl PreferencePayload {
    /// Trims the genre and rejects blank values.
    pub fn normalized(self) -> Result<Self, AppError> {
        let genre = self.genre.trim().to_string();
        if genre.is_empty() {
            return Err(AppError::UnprocessableEntity(
                "genre cannot be empty".to_string(),
            ));
        }
        Ok(Self { genre })
    }
}
