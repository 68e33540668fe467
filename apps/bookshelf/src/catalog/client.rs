use async_trait::async_trait;
use reqwest::Client;

use crate::auth::Credentials;
use crate::models::book::Book;
use crate::upstream::{read_json, UpstreamError};

const CATALOG_SERVICE: &str = "book service";

/// Read access to the catalog service, used by reviews and recommendations.
/// Requests carry the caller's forwarded credentials.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// `UpstreamError::NotFound` when the book does not exist.
    async fn get_book(&self, credentials: &Credentials, id: i64) -> Result<Book, UpstreamError>;

    async fn books_by_genre(
        &self,
        credentials: &Credentials,
        genre: &str,
    ) -> Result<Vec<Book>, UpstreamError>;
}

#[derive(Clone)]
pub struct HttpBookCatalog {
    client: Client,
    books_url: String,
}

impl HttpBookCatalog {
    pub fn new(client: Client, book_service_url: &str) -> Self {
        Self {
            client,
            books_url: format!("{book_service_url}/api/v1/books"),
        }
    }
}

#[async_trait]
impl BookCatalog for HttpBookCatalog {
    async fn get_book(&self, credentials: &Credentials, id: i64) -> Result<Book, UpstreamError> {
        let response = self
            .client
            .get(format!("{}/{id}", self.books_url))
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| UpstreamError::from_send(CATALOG_SERVICE, e))?;

        read_json(CATALOG_SERVICE, response).await
    }

    async fn books_by_genre(
        &self,
        credentials: &Credentials,
        genre: &str,
    ) -> Result<Vec<Book>, UpstreamError> {
        let response = self
            .client
            .get(&self.books_url)
            .query(&[("genre", genre)])
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| UpstreamError::from_send(CATALOG_SERVICE, e))?;

        read_json(CATALOG_SERVICE, response).await
    }
}
