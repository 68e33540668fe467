//! Book writes with an opportunistic summary step.
//!
//! The book is committed first. If the payload carries summary text, the
//! summaries service is asked for a generated version on the caller's behalf
//! and the stored text is replaced with it. Nothing in the summary step can
//! fail the write: on any error the book keeps the caller-supplied text.

use tracing::{info, warn};

use crate::auth::Identity;
use crate::catalog::store::BookStore;
use crate::errors::AppError;
use crate::models::book::{Book, BookPayload};
use crate::summaries::client::SummaryGateway;

pub async fn create_book(
    store: &dyn BookStore,
    summaries: &dyn SummaryGateway,
    identity: &Identity,
    payload: BookPayload,
) -> Result<Book, AppError> {
    payload.validate()?;
    let book = store.insert(&payload).await?;
    info!("Created book {} ({})", book.id, book.title);
    Ok(attach_summary(store, summaries, identity, book, payload.summary_source()).await)
}

/// Full replace. `NotFound` when the book does not exist.
pub async fn update_book(
    store: &dyn BookStore,
    summaries: &dyn SummaryGateway,
    identity: &Identity,
    id: i64,
    payload: BookPayload,
) -> Result<Book, AppError> {
    payload.validate()?;
    let book = store
        .update(id, &payload)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with ID {id} not found")))?;
    info!("Updated book {} ({})", book.id, book.title);
    Ok(attach_summary(store, summaries, identity, book, payload.summary_source()).await)
}

async fn attach_summary(
    store: &dyn BookStore,
    summaries: &dyn SummaryGateway,
    identity: &Identity,
    book: Book,
    source: Option<&str>,
) -> Book {
    let Some(source) = source else {
        return book;
    };

    let generated = match summaries
        .get_or_create(&identity.credentials, book.id, source)
        .await
    {
        Ok(view) => view.summary,
        Err(e) => {
            warn!("Failed to generate summary for book {}: {e}", book.id);
            return book;
        }
    };

    match store.set_summary(book.id, &generated).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            warn!("Book {} disappeared before its summary was stored", book.id);
            book
        }
        Err(e) => {
            warn!("Failed to store generated summary for book {}: {e}", book.id);
            book
        }
    }
}
