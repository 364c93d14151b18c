//! PostgreSQL repository tests
//!
//! Each test gets a fresh database with the migrations applied.
//! Run with: DATABASE_URL=postgres://... cargo test -- --ignored

use axum::{http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use campus_library_server::{
    models::{Book, BookInput, BorrowStatus, CreateBorrow, Student, StudentInput},
    repository::Repository,
    AppError,
};

async fn seed(repository: &Repository, quantity: i32) -> (Student, Book) {
    let student = repository
        .students
        .create(&StudentInput {
            name: "Priya Nair".to_string(),
            email: "priya@college.edu".to_string(),
            phone: None,
            branch: "Chemistry".to_string(),
            semester: 6,
        })
        .await
        .unwrap();

    let book = repository
        .books
        .create(&BookInput {
            title: "Physical Chemistry".to_string(),
            author: "Atkins".to_string(),
            isbn: None,
            quantity,
            available_quantity: quantity,
        })
        .await
        .unwrap();

    (student, book)
}

fn request(student: &Student, book: &Book) -> CreateBorrow {
    CreateBorrow {
        student_id: student.id,
        book_id: book.id,
        due_date: Utc::now().date_naive() + Duration::days(14),
    }
}

async fn borrow_rows(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM borrows")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
#[ignore]
async fn test_last_copy_can_only_be_borrowed_once(pool: PgPool) {
    let repository = Repository::new(pool.clone());
    let (student, book) = seed(&repository, 1).await;

    repository.borrows.create(&request(&student, &book)).await.unwrap();
    assert_eq!(repository.books.get(book.id).await.unwrap().available_quantity, 0);

    let second = repository.borrows.create(&request(&student, &book)).await;
    assert!(matches!(second, Err(AppError::NotAvailable(_))));

    assert_eq!(borrow_rows(&pool).await, 1);
    assert_eq!(repository.books.get(book.id).await.unwrap().available_quantity, 0);
}

#[sqlx::test]
#[ignore]
async fn test_concurrent_borrows_of_last_copy(pool: PgPool) {
    let repository = Repository::new(pool.clone());
    let (student, book) = seed(&repository, 1).await;
    let borrow = request(&student, &book);

    let (first, second) = tokio::join!(
        repository.borrows.create(&borrow),
        repository.borrows.create(&borrow)
    );

    assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(borrow_rows(&pool).await, 1);
    assert_eq!(repository.books.get(book.id).await.unwrap().available_quantity, 0);
}

#[sqlx::test]
#[ignore]
async fn test_double_return_leaves_availability(pool: PgPool) {
    let repository = Repository::new(pool);
    let (student, book) = seed(&repository, 2).await;

    let borrow = repository.borrows.create(&request(&student, &book)).await.unwrap();
    assert_eq!(repository.books.get(book.id).await.unwrap().available_quantity, 1);

    let returned = repository.borrows.mark_returned(borrow.id).await.unwrap();
    assert_eq!(returned.status, BorrowStatus::Returned);
    assert!(returned.return_date.is_some());
    assert_eq!(repository.books.get(book.id).await.unwrap().available_quantity, 2);

    let again = repository.borrows.mark_returned(borrow.id).await;
    assert!(matches!(again, Err(AppError::AlreadyReturned(_))));
    assert_eq!(repository.books.get(book.id).await.unwrap().available_quantity, 2);
}

#[sqlx::test]
#[ignore]
async fn test_status_filter_and_details(pool: PgPool) {
    let repository = Repository::new(pool);
    let (student, book) = seed(&repository, 3).await;
    let now = Utc::now();

    let returned = repository.borrows.create(&request(&student, &book)).await.unwrap();
    repository.borrows.mark_returned(returned.id).await.unwrap();
    let open = repository.borrows.create(&request(&student, &book)).await.unwrap();

    let all = repository.borrows.list(None, now).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, open.id);

    let borrowed = repository
        .borrows
        .list(Some(BorrowStatus::Borrowed), now)
        .await
        .unwrap();
    assert_eq!(borrowed.len(), 1);
    assert_eq!(borrowed[0].student.name, "Priya Nair");
    assert_eq!(borrowed[0].book.available_quantity, 2);
    assert!(!borrowed[0].is_overdue);
}

#[sqlx::test]
#[ignore]
async fn test_referenced_records_cannot_be_deleted(pool: PgPool) {
    let repository = Repository::new(pool.clone());
    let (student, book) = seed(&repository, 1).await;
    repository.borrows.create(&request(&student, &book)).await.unwrap();

    assert!(matches!(
        repository.students.delete(student.id).await,
        Err(AppError::StillReferenced(_))
    ));
    assert!(matches!(
        repository.books.delete(book.id).await,
        Err(AppError::StillReferenced(_))
    ));

    // A delete that slips past the check still hits the restricting foreign key
    let error = sqlx::query("DELETE FROM students WHERE id = $1")
        .bind(student.id)
        .execute(&pool)
        .await
        .unwrap_err();
    let response = AppError::from(error).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
