//! Borrow workflow service
//!
//! Creating a borrow and returning it each touch two records: the borrow row
//! and the book's available quantity. Both steps are delegated to the store
//! as a single operation, so a failure leaves neither record changed.

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    config::BorrowsConfig,
    error::{AppError, AppResult},
    models::{
        borrow::{BorrowOptions, BorrowQuery},
        BorrowDetails, CreateBorrow,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
    config: BorrowsConfig,
}

/// Reject due dates earlier than `today`
pub fn validate_due_date(due_date: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if due_date < today {
        return Err(AppError::Validation(format!(
            "Due date {} is in the past",
            due_date
        )));
    }
    Ok(())
}

/// `today` plus the configured loan length
pub fn default_due_date(today: NaiveDate, loan_days: i64) -> AppResult<NaiveDate> {
    Duration::try_days(loan_days)
        .and_then(|loan| today.checked_add_signed(loan))
        .ok_or_else(|| {
            AppError::Internal(format!("Loan length of {} days is out of range", loan_days))
        })
}

impl BorrowsService {
    pub fn new(repository: Repository, config: BorrowsConfig) -> Self {
        Self { repository, config }
    }

    /// List borrows, newest first
    pub async fn list(&self, query: &BorrowQuery) -> AppResult<Vec<BorrowDetails>> {
        self.repository.borrows.list(query.status, Utc::now()).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BorrowDetails> {
        self.repository.borrows.get(id, Utc::now()).await
    }

    /// Students and available books to pick from, with a suggested due date
    pub async fn options(&self) -> AppResult<BorrowOptions> {
        let students = self.repository.students.list_by_name().await?;
        let books = self.repository.books.list_available().await?;
        let default_due_date =
            default_due_date(Utc::now().date_naive(), self.config.default_loan_days)?;

        Ok(BorrowOptions {
            students,
            books,
            default_due_date,
        })
    }

    /// Lend one copy of a book to a student
    pub async fn create(&self, request: CreateBorrow) -> AppResult<BorrowDetails> {
        validate_due_date(request.due_date, Utc::now().date_naive())?;

        let borrow = self
            .repository
            .borrows
            .create(&request)
            .await
            .map_err(|e| {
                tracing::warn!(
                    "Borrow of book {} by student {} refused: {}",
                    request.book_id,
                    request.student_id,
                    e
                );
                e
            })?;

        tracing::info!(
            "Borrow {} created: book {} to student {}, due {}",
            borrow.id,
            borrow.book_id,
            borrow.student_id,
            borrow.due_date
        );

        self.get(borrow.id).await
    }

    /// Mark a borrow returned and put its copy back on the shelf
    pub async fn return_borrow(&self, id: Uuid) -> AppResult<BorrowDetails> {
        let borrow = self.repository.borrows.mark_returned(id).await.map_err(|e| {
            tracing::warn!("Return of borrow {} refused: {}", id, e);
            e
        })?;

        tracing::info!("Borrow {} returned (book {})", borrow.id, borrow.book_id);

        self.get(borrow.id).await
    }
}
