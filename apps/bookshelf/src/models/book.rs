use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub year_published: Option<i32>,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace body for a book. `summary` carries raw text that may be
/// swapped for a generated summary after the write.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPayload {
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub year_published: Option<i32>,
    pub summary: Option<String>,
}

impl BookPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::UnprocessableEntity(
                "title cannot be empty".to_string(),
            ));
        }
        if let Some(year) = self.year_published {
            if !(0..=9999).contains(&year) {
                return Err(AppError::UnprocessableEntity(format!(
                    "year_published must be between 0 and 9999, got {year}"
                )));
            }
        }
        Ok(())
    }

    /// The text worth summarizing, if any.
    pub fn summary_source(&self) -> Option<&str> {
        self.summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
