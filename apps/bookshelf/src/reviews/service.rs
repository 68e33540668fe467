//! Review writes and the per-book reviews summary.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::Identity;
use crate::catalog::client::BookCatalog;
use crate::errors::AppError;
use crate::models::review::{ReviewPayload, ReviewRow};
use crate::reviews::store::{ReviewFilter, ReviewStore};
use crate::summaries::client::SummaryGateway;
use crate::upstream::UpstreamError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewsSummary {
    pub subject_id: i64,
    pub summary: String,
    pub average_rating: f64,
    pub total_reviews: usize,
}

/// Creates a review after confirming with the catalog that the book exists.
pub async fn create_review(
    store: &dyn ReviewStore,
    catalog: &dyn BookCatalog,
    identity: &Identity,
    book_id: i64,
    payload: ReviewPayload,
) -> Result<ReviewRow, AppError> {
    payload.validate()?;
    match catalog.get_book(&identity.credentials, book_id).await {
        Ok(_) => {}
        Err(UpstreamError::NotFound { .. }) => {
            return Err(AppError::NotFound(format!(
                "Book with ID {book_id} not found"
            )))
        }
        Err(e) => return Err(e.into()),
    }

    let review = store.insert(book_id, identity.user_id, &payload).await?;
    info!("Created review {} for book {book_id}", review.id);
    Ok(review)
}

pub async fn get_review(store: &dyn ReviewStore, id: i64) -> Result<ReviewRow, AppError> {
    store.get(id).await?.ok_or_else(|| not_found(id))
}

/// Only the author may change a review.
pub async fn update_review(
    store: &dyn ReviewStore,
    identity: &Identity,
    id: i64,
    payload: ReviewPayload,
) -> Result<ReviewRow, AppError> {
    payload.validate()?;
    let existing = get_review(store, id).await?;
    ensure_owner(&existing, identity)?;
    store.update(id, &payload).await?.ok_or_else(|| not_found(id))
}

/// Only the author may delete a review.
pub async fn delete_review(
    store: &dyn ReviewStore,
    identity: &Identity,
    id: i64,
) -> Result<(), AppError> {
    let existing = get_review(store, id).await?;
    ensure_owner(&existing, identity)?;
    if store.delete(id).await? {
        Ok(())
    } else {
        Err(not_found(id))
    }
}

/// Summarizes every review of a book through the summaries service.
///
/// Unlike the catalog, there is no fallback: any failure of the summary call
/// is returned to the caller.
pub async fn reviews_summary(
    store: &dyn ReviewStore,
    summaries: &dyn SummaryGateway,
    identity: &Identity,
    book_id: i64,
) -> Result<ReviewsSummary, AppError> {
    let reviews = store
        .list(ReviewFilter {
            book_id: Some(book_id),
            user_id: None,
        })
        .await?;
    if reviews.is_empty() {
        return Err(AppError::NotFound(format!(
            "No reviews found for book {book_id}"
        )));
    }

    let average_rating = average_rating(&reviews);
    let content = review_digest(&reviews, average_rating);
    let view = summaries
        .get_or_create(&identity.credentials, book_id, &content)
        .await?;

    Ok(ReviewsSummary {
        subject_id: book_id,
        summary: view.summary,
        average_rating,
        total_reviews: reviews.len(),
    })
}

/// Arithmetic mean of the ratings. Callers guarantee a non-empty slice.
pub fn average_rating(reviews: &[ReviewRow]) -> f64 {
    reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64
}

/// Text sent for summarization: a header with the mean and count, then one
/// block per review. Blank comments are left out.
pub fn review_digest(reviews: &[ReviewRow], average: f64) -> String {
    let mut content = format!(
        "Book Reviews Summary\nAverage Rating: {average:.1}/5\nTotal Reviews: {}\n\nIndividual Reviews:\n",
        reviews.len()
    );
    for review in reviews {
        content.push_str(&format!("\nRating: {}/5\n", display_rating(review.rating)));
        if let Some(comment) = review.comment.as_deref().filter(|c| !c.trim().is_empty()) {
            content.push_str(&format!("Review: {comment}\n"));
        }
    }
    content
}

// Whole ratings keep one decimal ("4.0"), fractional ones print as-is.
fn display_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{rating:.1}")
    } else {
        rating.to_string()
    }
}

fn ensure_owner(review: &ReviewRow, identity: &Identity) -> Result<(), AppError> {
    if review.user_id != identity.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to modify this review".to_string(),
        ));
    }
    Ok(())
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Review with ID {id} not found"))
}
