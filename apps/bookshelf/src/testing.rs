//! In-memory stand-ins for every store, client and verifier, used by the
//! unit tests. Nothing here touches a database or the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::response::Response;
use chrono::Utc;
use tokio::sync::Barrier;

use crate::accounts::store::AccountStore;
use crate::audit::AuditEvent;
use crate::auth::{CredentialVerifier, Credentials, Identity};
use crate::catalog::client::BookCatalog;
use crate::catalog::store::BookStore;
use crate::db::StoreError;
use crate::errors::AppError;
use crate::llm_client::{LlmError, Summarizer};
use crate::models::account::{AuditLogRow, UserRow};
use crate::models::book::{Book, BookPayload};
use crate::models::preference::PreferenceRow;
use crate::models::review::{ReviewPayload, ReviewRow};
use crate::models::summary::{NewSummary, SummaryRecord, SummaryView};
use crate::recommendations::store::PreferenceStore;
use crate::reviews::store::{ReviewFilter, ReviewStore};
use crate::summaries::client::SummaryGateway;
use crate::summaries::store::SummaryStore;
use crate::upstream::UpstreamError;

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A verified caller whose forwarded credentials are `reader:pw`.
pub fn identity(user_id: i64) -> Identity {
    Identity {
        user_id,
        credentials: Credentials::new("reader", "pw"),
    }
}

fn injected_failure() -> StoreError {
    StoreError::Database(sqlx::Error::Protocol("injected failure".to_string()))
}

// ── Auth ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StaticVerifier {
    users: HashMap<String, (String, i64)>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, username: &str, password: &str, user_id: i64) -> Self {
        self.users
            .insert(username.to_string(), (password.to_string(), user_id));
        self
    }
}

#[async_trait]
impl CredentialVerifier for StaticVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<i64, AppError> {
        match self.users.get(&credentials.username) {
            Some((password, user_id)) if *password == credentials.password => Ok(*user_id),
            _ => Err(AppError::Unauthorized("Invalid credentials".to_string())),
        }
    }
}

// ── Summaries ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySummaryStore {
    records: Mutex<Vec<SummaryRecord>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemorySummaryStore {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Successful inserts and updates.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SummaryStore for MemorySummaryStore {
    async fn find(
        &self,
        subject_id: i64,
        requester_id: i64,
    ) -> Result<Option<SummaryRecord>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.subject_id == subject_id && r.requester_id == requester_id)
            .cloned())
    }

    async fn insert(&self, summary: NewSummary) -> Result<SummaryRecord, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let mut records = self.records.lock().unwrap();
        if records
            .iter()
            .any(|r| r.subject_id == summary.subject_id && r.requester_id == summary.requester_id)
        {
            return Err(StoreError::Conflict(
                "book_summaries_subject_requester_key".to_string(),
            ));
        }
        let now = Utc::now();
        let record = SummaryRecord {
            id: records.len() as i64 + 1,
            subject_id: summary.subject_id,
            requester_id: summary.requester_id,
            source_content: summary.source_content,
            summary_text: summary.summary_text,
            created_at: now,
            updated_at: now,
        };
        records.push(record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn update(
        &self,
        id: i64,
        source_content: &str,
        summary_text: &str,
    ) -> Result<SummaryRecord, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        record.source_content = source_content.to_string();
        record.summary_text = summary_text.to_string();
        record.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }
}

enum Script {
    Replies(Vec<String>),
    Fail(Box<dyn Fn() -> LlmError + Send + Sync>),
}

/// Summarizer that answers from a script and counts its calls.
pub struct ScriptedSummarizer {
    script: Script,
    calls: AtomicUsize,
    rendezvous: Option<Barrier>,
}

impl ScriptedSummarizer {
    pub fn replying(text: &str) -> Self {
        Self::sequence(&[text])
    }

    /// Answers in order; the last reply repeats.
    pub fn sequence(replies: &[&str]) -> Self {
        Self {
            script: Script::Replies(replies.iter().map(|r| r.to_string()).collect()),
            calls: AtomicUsize::new(0),
            rendezvous: None,
        }
    }

    pub fn failing(error: impl Fn() -> LlmError + Send + Sync + 'static) -> Self {
        Self {
            script: Script::Fail(Box::new(error)),
            calls: AtomicUsize::new(0),
            rendezvous: None,
        }
    }

    /// Holds every call until `parties` calls are in flight.
    pub fn with_rendezvous(mut self, parties: usize) -> Self {
        self.rendezvous = Some(Barrier::new(parties));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, _content: &str) -> Result<String, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
        match &self.script {
            Script::Replies(replies) => Ok(replies[call.min(replies.len() - 1)].clone()),
            Script::Fail(error) => Err(error()),
        }
    }
}

/// Gateway that records `(username, subject_id, content)` for every request.
pub struct FakeSummaryGateway {
    reply: Result<String, Box<dyn Fn() -> UpstreamError + Send + Sync>>,
    requests: Mutex<Vec<(String, i64, String)>>,
}

impl FakeSummaryGateway {
    pub fn replying(summary: &str) -> Self {
        Self {
            reply: Ok(summary.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: impl Fn() -> UpstreamError + Send + Sync + 'static) -> Self {
        Self {
            reply: Err(Box::new(error)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, i64, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummaryGateway for FakeSummaryGateway {
    async fn get_or_create(
        &self,
        credentials: &Credentials,
        subject_id: i64,
        content: &str,
    ) -> Result<SummaryView, UpstreamError> {
        self.requests.lock().unwrap().push((
            credentials.username.clone(),
            subject_id,
            content.to_string(),
        ));
        match &self.reply {
            Ok(summary) => {
                let now = Utc::now();
                Ok(SummaryView {
                    id: 1,
                    subject_id,
                    content: content.to_string(),
                    summary: summary.clone(),
                    created_at: now,
                    updated_at: now,
                })
            }
            Err(error) => Err(error()),
        }
    }
}

// ── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBookStore {
    books: Mutex<Vec<Book>>,
    next_id: AtomicI64,
    fail_summary_writes: AtomicBool,
}

impl MemoryBookStore {
    pub fn fail_summary_writes(&self, fail: bool) {
        self.fail_summary_writes.store(fail, Ordering::SeqCst);
    }
}

fn apply_payload(book: &mut Book, payload: &BookPayload) {
    book.title = payload.title.clone();
    book.author = payload.author.clone();
    book.genre = payload.genre.clone();
    book.year_published = payload.year_published;
    book.summary = payload.summary.clone();
    book.updated_at = Utc::now();
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, payload: &BookPayload) -> Result<Book, StoreError> {
        let now = Utc::now();
        let mut book = Book {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: String::new(),
            author: None,
            genre: None,
            year_published: None,
            summary: None,
            created_at: now,
            updated_at: now,
        };
        apply_payload(&mut book, payload);
        self.books.lock().unwrap().push(book.clone());
        Ok(book)
    }

    async fn get(&self, id: i64) -> Result<Option<Book>, StoreError> {
        Ok(self
            .books
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned())
    }

    async fn list(&self, genre: Option<&str>) -> Result<Vec<Book>, StoreError> {
        Ok(self
            .books
            .lock()
            .unwrap()
            .iter()
            .filter(|b| genre.is_none() || b.genre.as_deref() == genre)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, payload: &BookPayload) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.lock().unwrap();
        Ok(books.iter_mut().find(|b| b.id == id).map(|book| {
            apply_payload(book, payload);
            book.clone()
        }))
    }

    async fn set_summary(&self, id: i64, summary: &str) -> Result<Option<Book>, StoreError> {
        if self.fail_summary_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let mut books = self.books.lock().unwrap();
        Ok(books.iter_mut().find(|b| b.id == id).map(|book| {
            book.summary = Some(summary.to_string());
            book.updated_at = Utc::now();
            book.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut books = self.books.lock().unwrap();
        let before = books.len();
        books.retain(|b| b.id != id);
        Ok(books.len() < before)
    }
}

/// Catalog client over a fixed list of books.
pub struct FakeBookCatalog {
    books: Vec<Book>,
    extra_genres: Vec<(i64, String)>,
    failing_genre: Option<String>,
    genre_queries: Mutex<Vec<String>>,
}

impl FakeBookCatalog {
    pub fn with_books(books: &[(i64, &str, &str)]) -> Self {
        let now = Utc::now();
        Self {
            books: books
                .iter()
                .map(|(id, title, genre)| Book {
                    id: *id,
                    title: title.to_string(),
                    author: None,
                    genre: Some(genre.to_string()),
                    year_published: None,
                    summary: None,
                    created_at: now,
                    updated_at: now,
                })
                .collect(),
            extra_genres: Vec::new(),
            failing_genre: None,
            genre_queries: Mutex::new(Vec::new()),
        }
    }

    /// Also returns book `id` when `genre` is queried.
    pub fn also_in_genre(mut self, id: i64, genre: &str) -> Self {
        self.extra_genres.push((id, genre.to_string()));
        self
    }

    /// Queries for `genre` fail as if the catalog were down.
    pub fn failing_genre(mut self, genre: &str) -> Self {
        self.failing_genre = Some(genre.to_string());
        self
    }

    pub fn genre_queries(&self) -> Vec<String> {
        self.genre_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookCatalog for FakeBookCatalog {
    async fn get_book(&self, _credentials: &Credentials, id: i64) -> Result<Book, UpstreamError> {
        self.books
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(UpstreamError::NotFound {
                service: "book service",
                detail: format!("Book with ID {id} not found"),
            })
    }

    async fn books_by_genre(
        &self,
        _credentials: &Credentials,
        genre: &str,
    ) -> Result<Vec<Book>, UpstreamError> {
        self.genre_queries.lock().unwrap().push(genre.to_string());
        if self.failing_genre.as_deref() == Some(genre) {
            return Err(UpstreamError::Unavailable {
                service: "book service",
                detail: "connection refused".to_string(),
            });
        }
        Ok(self
            .books
            .iter()
            .filter(|b| {
                b.genre.as_deref() == Some(genre)
                    || self
                        .extra_genres
                        .iter()
                        .any(|(id, g)| *id == b.id && g == genre)
            })
            .cloned()
            .collect())
    }
}

// ── Reviews ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryReviewStore {
    reviews: Mutex<Vec<ReviewRow>>,
    next_id: AtomicI64,
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn insert(
        &self,
        book_id: i64,
        user_id: i64,
        review: &ReviewPayload,
    ) -> Result<ReviewRow, StoreError> {
        let now = Utc::now();
        let row = ReviewRow {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            book_id,
            user_id,
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: now,
            updated_at: now,
        };
        self.reviews.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Option<ReviewRow>, StoreError> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list(&self, filter: ReviewFilter) -> Result<Vec<ReviewRow>, StoreError> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.book_id.map_or(true, |id| r.book_id == id))
            .filter(|r| filter.user_id.map_or(true, |id| r.user_id == id))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: i64,
        review: &ReviewPayload,
    ) -> Result<Option<ReviewRow>, StoreError> {
        let mut reviews = self.reviews.lock().unwrap();
        Ok(reviews.iter_mut().find(|r| r.id == id).map(|row| {
            row.rating = review.rating;
            row.comment = review.comment.clone();
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut reviews = self.reviews.lock().unwrap();
        let before = reviews.len();
        reviews.retain(|r| r.id != id);
        Ok(reviews.len() < before)
    }
}

// ── Recommendations ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryPreferenceStore {
    preferences: Mutex<Vec<PreferenceRow>>,
    next_id: AtomicI64,
    fail_reads: AtomicBool,
}

impl MemoryPreferenceStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn insert(&self, user_id: i64, genre: &str) -> Result<PreferenceRow, StoreError> {
        let now = Utc::now();
        let row = PreferenceRow {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            genre: genre.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.preferences.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<PreferenceRow>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(self
            .preferences
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, user_id: i64, id: i64) -> Result<bool, StoreError> {
        let mut preferences = self.preferences.lock().unwrap();
        let before = preferences.len();
        preferences.retain(|p| !(p.id == id && p.user_id == user_id));
        Ok(preferences.len() < before)
    }
}

// ── Accounts ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryAccountStore {
    users: Mutex<Vec<UserRow>>,
    logs: Mutex<Vec<AuditLogRow>>,
}

impl MemoryAccountStore {
    pub fn logs(&self) -> Vec<AuditLogRow> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == username) {
            return Err(StoreError::Conflict("users_username_key".to_string()));
        }
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        let user = UserRow {
            id: users.len() as i64 + 1,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_log(&self, event: &AuditEvent) -> Result<AuditLogRow, StoreError> {
        let mut logs = self.logs.lock().unwrap();
        let row = AuditLogRow {
            id: logs.len() as i64 + 1,
            user_id: event.user_id,
            service: event.service.clone(),
            action: event.action.clone(),
            status: event.status.as_str().to_string(),
            details: event.details.clone(),
            created_at: Utc::now(),
        };
        logs.push(row.clone());
        Ok(row)
    }
}
