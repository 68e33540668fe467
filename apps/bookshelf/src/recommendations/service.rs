//! Genre-driven recommendations.
//!
//! One catalog query per distinct preferred genre, merged into a single list
//! with no repeated book ids. Order is first-seen: genres in preference order,
//! books in the order the catalog returned them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::Identity;
use crate::catalog::client::BookCatalog;
use crate::errors::AppError;
use crate::models::book::Book;
use crate::models::preference::PreferenceRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecommendation {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub year_published: Option<i32>,
    pub summary: Option<String>,
}

impl From<Book> for BookRecommendation {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            year_published: book.year_published,
            summary: book.summary,
        }
    }
}

/// Fails with `NotFound` when the user has no preferences. Any failed genre
/// query fails the whole call; partial lists are never returned.
pub async fn recommend(
    catalog: &dyn BookCatalog,
    identity: &Identity,
    preferences: &[PreferenceRow],
) -> Result<Vec<BookRecommendation>, AppError> {
    if preferences.is_empty() {
        return Err(AppError::NotFound(
            "No preferences found for user".to_string(),
        ));
    }

    let mut genres_seen = HashSet::new();
    let mut books_seen = HashSet::new();
    let mut recommendations = Vec::new();

    for preference in preferences {
        if !genres_seen.insert(preference.genre.as_str()) {
            continue;
        }
        let books = catalog
            .books_by_genre(&identity.credentials, &preference.genre)
            .await?;
        debug!("Genre '{}' matched {} books", preference.genre, books.len());
        for book in books {
            if books_seen.insert(book.id) {
                recommendations.push(book.into());
            }
        }
    }

    Ok(recommendations)
}
