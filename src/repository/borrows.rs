//! Borrows repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, Borrow, BorrowDetails, BorrowStatus, CreateBorrow, Student},
};

use super::{BorrowStore, BOOK_NOT_AVAILABLE};

const DETAILS_SELECT: &str = r#"
    SELECT b.id, b.student_id, b.book_id, b.borrow_date, b.due_date,
           b.return_date, b.status, b.created_at,
           s.name AS student_name, s.email AS student_email, s.phone AS student_phone,
           s.branch AS student_branch, s.semester AS student_semester,
           s.created_at AS student_created_at,
           k.title AS book_title, k.author AS book_author, k.isbn AS book_isbn,
           k.quantity AS book_quantity, k.available_quantity AS book_available_quantity,
           k.created_at AS book_created_at
    FROM borrows b
    JOIN students s ON s.id = b.student_id
    JOIN books k ON k.id = b.book_id
"#;

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn details_from_row(row: &PgRow, now: DateTime<Utc>) -> AppResult<BorrowDetails> {
    let borrow = Borrow {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        book_id: row.try_get("book_id")?,
        borrow_date: row.try_get("borrow_date")?,
        due_date: row.try_get("due_date")?,
        return_date: row.try_get("return_date")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    };

    let student = Student {
        id: borrow.student_id,
        name: row.try_get("student_name")?,
        email: row.try_get("student_email")?,
        phone: row.try_get("student_phone")?,
        branch: row.try_get("student_branch")?,
        semester: row.try_get("student_semester")?,
        created_at: row.try_get("student_created_at")?,
    };

    let book = Book {
        id: borrow.book_id,
        title: row.try_get("book_title")?,
        author: row.try_get("book_author")?,
        isbn: row.try_get("book_isbn")?,
        quantity: row.try_get("book_quantity")?,
        available_quantity: row.try_get("book_available_quantity")?,
        created_at: row.try_get("book_created_at")?,
    };

    Ok(BorrowDetails::assemble(borrow, student, book, now))
}

#[async_trait]
impl BorrowStore for BorrowsRepository {
    async fn list(&self, status: Option<BorrowStatus>, now: DateTime<Utc>) -> AppResult<Vec<BorrowDetails>> {
        let rows = sqlx::query(&format!(
            "{} WHERE ($1::text IS NULL OR b.status = $1) ORDER BY b.created_at DESC",
            DETAILS_SELECT
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| details_from_row(row, now)).collect()
    }

    async fn get(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<BorrowDetails> {
        let row = sqlx::query(&format!("{} WHERE b.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))?;

        details_from_row(&row, now)
    }

    async fn create(&self, borrow: &CreateBorrow) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        let student_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
                .bind(borrow.student_id)
                .fetch_one(&mut *tx)
                .await?;

        if !student_exists {
            return Err(AppError::NotFound(format!(
                "Student with id {} not found",
                borrow.student_id
            )));
        }

        // Conditional decrement: concurrent borrows of the last copy cannot both succeed
        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET available_quantity = available_quantity - 1
            WHERE id = $1 AND available_quantity > 0
            RETURNING available_quantity
            "#,
        )
        .bind(borrow.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        if remaining.is_none() {
            let book_exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                    .bind(borrow.book_id)
                    .fetch_one(&mut *tx)
                    .await?;

            return Err(if book_exists {
                AppError::NotAvailable(BOOK_NOT_AVAILABLE.to_string())
            } else {
                AppError::NotFound(format!("Book with id {} not found", borrow.book_id))
            });
        }

        let created = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (student_id, book_id, borrow_date, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(borrow.student_id)
        .bind(borrow.book_id)
        .bind(Utc::now())
        .bind(borrow.due_date)
        .bind(BorrowStatus::Borrowed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn mark_returned(&self, id: Uuid) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        let returned = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows
            SET status = $1, return_date = $2
            WHERE id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(BorrowStatus::Returned)
        .bind(Utc::now())
        .bind(id)
        .bind(BorrowStatus::Borrowed)
        .fetch_optional(&mut *tx)
        .await?;

        let returned = match returned {
            Some(borrow) => borrow,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrows WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;

                return Err(if exists {
                    AppError::AlreadyReturned("Borrow has already been returned".to_string())
                } else {
                    AppError::NotFound(format!("Borrow with id {} not found", id))
                });
            }
        };

        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_quantity = available_quantity + 1
            WHERE id = $1 AND available_quantity < quantity
            "#,
        )
        .bind(returned.book_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(
                "Book {} already has every copy available, count left unchanged",
                returned.book_id
            );
        }

        tx.commit().await?;

        Ok(returned)
    }
}
