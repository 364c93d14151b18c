//! Repository layer for database operations
//!
//! Each collection is reached through a store trait so the services run
//! unchanged against PostgreSQL or the in-memory backend.

pub mod books;
pub mod borrows;
pub mod identity;
pub mod memory;
pub mod students;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Account, Book, BookInput, Borrow, BorrowDetails, BorrowStatus, CreateBorrow, Session,
        Student, StudentInput,
    },
};

pub(crate) const BOOK_NOT_AVAILABLE: &str = "This book is not available for borrowing.";

#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Newest first
    async fn list(&self) -> AppResult<Vec<Student>>;
    async fn list_by_name(&self) -> AppResult<Vec<Student>>;
    async fn get(&self, id: Uuid) -> AppResult<Student>;
    async fn create(&self, student: &StudentInput) -> AppResult<Student>;
    async fn update(&self, id: Uuid, student: &StudentInput) -> AppResult<Student>;
    /// Fails with `StillReferenced` while any borrow points at the student
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Newest first
    async fn list(&self) -> AppResult<Vec<Book>>;
    /// Books with at least one copy on the shelf, by title
    async fn list_available(&self) -> AppResult<Vec<Book>>;
    async fn get(&self, id: Uuid) -> AppResult<Book>;
    async fn create(&self, book: &BookInput) -> AppResult<Book>;
    async fn update(&self, id: Uuid, book: &BookInput) -> AppResult<Book>;
    /// Fails with `StillReferenced` while any borrow points at the book
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait BorrowStore: Send + Sync {
    /// Newest first, joined with student and book
    async fn list(&self, status: Option<BorrowStatus>, now: DateTime<Utc>) -> AppResult<Vec<BorrowDetails>>;
    async fn get(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<BorrowDetails>;
    /// Insert a borrowed row and take one copy off the shelf, all or nothing
    async fn create(&self, borrow: &CreateBorrow) -> AppResult<Borrow>;
    /// Mark returned and put the copy back, all or nothing
    async fn mark_returned(&self, id: Uuid) -> AppResult<Borrow>;
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken (case-insensitive)
    async fn create_account(&self, email: &str, password_hash: &str) -> AppResult<Account>;
    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>>;
    async fn get_account(&self, id: Uuid) -> AppResult<Account>;
    async fn create_session(&self, account_id: Uuid, expires_at: DateTime<Utc>) -> AppResult<Session>;
    async fn get_session(&self, id: Uuid) -> AppResult<Option<Session>>;
    async fn delete_session(&self, id: Uuid) -> AppResult<()>;
    /// Remove every session that expired at or before `now`; returns how many went
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AppResult<u64>;
    /// Existence of an `admin_users` row for the account
    async fn is_admin(&self, account_id: Uuid) -> AppResult<bool>;
    async fn grant_admin(&self, account_id: Uuid) -> AppResult<()>;
}

/// Main repository struct holding one store per collection
#[derive(Clone)]
pub struct Repository {
    pub students: Arc<dyn StudentStore>,
    pub books: Arc<dyn BookStore>,
    pub borrows: Arc<dyn BorrowStore>,
    pub identity: Arc<dyn IdentityStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            students: Arc::new(students::StudentsRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            borrows: Arc::new(borrows::BorrowsRepository::new(pool.clone())),
            identity: Arc::new(identity::IdentityRepository::new(pool)),
        }
    }

    /// Create a repository backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::default();
        Self {
            students: Arc::new(store.clone()),
            books: Arc::new(store.clone()),
            borrows: Arc::new(store.clone()),
            identity: Arc::new(store),
        }
    }
}
