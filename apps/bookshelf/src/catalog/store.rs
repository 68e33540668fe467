use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::StoreError;
use crate::models::book::{Book, BookPayload};

pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id              BIGSERIAL PRIMARY KEY,
        title           TEXT        NOT NULL,
        author          TEXT,
        genre           TEXT,
        year_published  INTEGER,
        summary         TEXT,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_books_genre ON books (genre)",
];

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, book: &BookPayload) -> Result<Book, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError>;

    /// All books, or only those whose genre matches exactly. Ordered by id.
    async fn list(&self, genre: Option<&str>) -> Result<Vec<Book>, StoreError>;

    /// Replaces every field. `None` when the book does not exist.
    async fn update(&self, id: i64, book: &BookPayload) -> Result<Option<Book>, StoreError>;

    async fn set_summary(&self, id: i64, summary: &str) -> Result<Option<Book>, StoreError>;

    /// `false` when there was nothing to delete.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn insert(&self, book: &BookPayload) -> Result<Book, StoreError> {
        Ok(sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, genre, year_published, summary)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.year_published)
        .bind(&book.summary)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError> {
        Ok(sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self, genre: Option<&str>) -> Result<Vec<Book>, StoreError> {
        Ok(sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE ($1::TEXT IS NULL OR genre = $1) ORDER BY id",
        )
        .bind(genre)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update(&self, id: i64, book: &BookPayload) -> Result<Option<Book>, StoreError> {
        Ok(sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, genre = $3, year_published = $4,
                summary = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.year_published)
        .bind(&book.summary)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_summary(&self, id: i64, summary: &str) -> Result<Option<Book>, StoreError> {
        Ok(sqlx::query_as::<_, Book>(
            "UPDATE books SET summary = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(summary)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
