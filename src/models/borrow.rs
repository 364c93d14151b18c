//! Borrow model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{book::Book, student::Student};

/// Borrow lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Borrowed,
    Returned,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Borrowed => "borrowed",
            BorrowStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "borrowed" => Ok(BorrowStatus::Borrowed),
            "returned" => Ok(BorrowStatus::Returned),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Borrow record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub book_id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
    pub created_at: DateTime<Utc>,
}

impl Borrow {
    /// A borrow is overdue while it is out and its due date (midnight UTC) has passed
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status == BorrowStatus::Borrowed && self.due_date.and_time(chrono::NaiveTime::MIN).and_utc() < now
    }
}

/// Borrow joined with its student and book
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowDetails {
    pub id: Uuid,
    pub student_id: Uuid,
    pub book_id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
    pub created_at: DateTime<Utc>,
    pub student: Student,
    pub book: Book,
    /// Computed when the response is built, never stored
    pub is_overdue: bool,
}

impl BorrowDetails {
    pub fn assemble(borrow: Borrow, student: Student, book: Book, now: DateTime<Utc>) -> Self {
        let is_overdue = borrow.is_overdue_at(now);
        Self {
            id: borrow.id,
            student_id: borrow.student_id,
            book_id: borrow.book_id,
            borrow_date: borrow.borrow_date,
            due_date: borrow.due_date,
            return_date: borrow.return_date,
            status: borrow.status,
            created_at: borrow.created_at,
            student,
            book,
            is_overdue,
        }
    }
}

/// Create borrow request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBorrow {
    pub student_id: Uuid,
    pub book_id: Uuid,
    /// Must be today or later
    pub due_date: NaiveDate,
}

/// Borrow list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BorrowQuery {
    pub status: Option<BorrowStatus>,
}

/// Choices offered when creating a borrow
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowOptions {
    /// All students, by name
    pub students: Vec<Student>,
    /// Books with at least one available copy, by title
    pub books: Vec<Book>,
    pub default_due_date: NaiveDate,
}
