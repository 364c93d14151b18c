//! In-memory backend.
//!
//! Keeps every collection in one process-local state behind a single lock,
//! so multi-record operations (borrow, return) are as atomic here as the
//! transactions of the PostgreSQL repositories. Rows are kept in insertion
//! order, which doubles as creation order.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Account, Book, BookInput, Borrow, BorrowDetails, BorrowStatus, CreateBorrow, Session,
        Student, StudentInput,
    },
};

use super::{BookStore, BorrowStore, IdentityStore, StudentStore, BOOK_NOT_AVAILABLE};

#[derive(Default)]
struct MemoryState {
    students: Vec<Student>,
    books: Vec<Book>,
    borrows: Vec<Borrow>,
    accounts: Vec<Account>,
    sessions: HashMap<Uuid, Session>,
    admins: HashSet<Uuid>,
}

impl MemoryState {
    fn student(&self, id: Uuid) -> AppResult<&Student> {
        self.students
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))
    }

    fn book(&self, id: Uuid) -> AppResult<&Book> {
        self.books
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    fn book_mut(&mut self, id: Uuid) -> AppResult<&mut Book> {
        self.books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    fn details(&self, borrow: &Borrow, now: DateTime<Utc>) -> AppResult<BorrowDetails> {
        let student = self.student(borrow.student_id)?.clone();
        let book = self.book(borrow.book_id)?.clone();
        Ok(BorrowDetails::assemble(borrow.clone(), student, book, now))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Student>> {
        let state = self.state.read().await;
        Ok(state.students.iter().rev().cloned().collect())
    }

    async fn list_by_name(&self) -> AppResult<Vec<Student>> {
        let state = self.state.read().await;
        let mut students = state.students.clone();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn get(&self, id: Uuid) -> AppResult<Student> {
        let state = self.state.read().await;
        state.student(id).cloned()
    }

    async fn create(&self, student: &StudentInput) -> AppResult<Student> {
        let mut state = self.state.write().await;
        let created = Student {
            id: Uuid::new_v4(),
            name: student.name.clone(),
            email: student.email.clone(),
            phone: student.phone.clone(),
            branch: student.branch.clone(),
            semester: student.semester,
            created_at: Utc::now(),
        };
        state.students.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, student: &StudentInput) -> AppResult<Student> {
        let mut state = self.state.write().await;
        let existing = state
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))?;

        existing.name = student.name.clone();
        existing.email = student.email.clone();
        existing.phone = student.phone.clone();
        existing.branch = student.branch.clone();
        existing.semester = student.semester;
        Ok(existing.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.student(id)?;

        if state.borrows.iter().any(|b| b.student_id == id) {
            return Err(AppError::StillReferenced(
                "Student has borrow records and cannot be deleted".to_string(),
            ));
        }

        state.students.retain(|s| s.id != id);
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        Ok(state.books.iter().rev().cloned().collect())
    }

    async fn list_available(&self) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        let mut books: Vec<Book> = state
            .books
            .iter()
            .filter(|b| b.available_quantity > 0)
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn get(&self, id: Uuid) -> AppResult<Book> {
        let state = self.state.read().await;
        state.book(id).cloned()
    }

    async fn create(&self, book: &BookInput) -> AppResult<Book> {
        let mut state = self.state.write().await;
        let created = Book {
            id: Uuid::new_v4(),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            quantity: book.quantity,
            available_quantity: book.available_quantity,
            created_at: Utc::now(),
        };
        state.books.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, book: &BookInput) -> AppResult<Book> {
        let mut state = self.state.write().await;
        let existing = state.book_mut(id)?;

        existing.title = book.title.clone();
        existing.author = book.author.clone();
        existing.isbn = book.isbn.clone();
        existing.quantity = book.quantity;
        existing.available_quantity = book.available_quantity;
        Ok(existing.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.book(id)?;

        if state.borrows.iter().any(|b| b.book_id == id) {
            return Err(AppError::StillReferenced(
                "Book has borrow records and cannot be deleted".to_string(),
            ));
        }

        state.books.retain(|b| b.id != id);
        Ok(())
    }
}

#[async_trait]
impl BorrowStore for MemoryStore {
    async fn list(&self, status: Option<BorrowStatus>, now: DateTime<Utc>) -> AppResult<Vec<BorrowDetails>> {
        let state = self.state.read().await;
        state
            .borrows
            .iter()
            .rev()
            .filter(|b| status.map_or(true, |s| b.status == s))
            .map(|b| state.details(b, now))
            .collect()
    }

    async fn get(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<BorrowDetails> {
        let state = self.state.read().await;
        let borrow = state
            .borrows
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))?;
        state.details(borrow, now)
    }

    async fn create(&self, borrow: &CreateBorrow) -> AppResult<Borrow> {
        let mut state = self.state.write().await;
        state.student(borrow.student_id)?;

        let book = state.book_mut(borrow.book_id)?;
        if book.available_quantity <= 0 {
            return Err(AppError::NotAvailable(BOOK_NOT_AVAILABLE.to_string()));
        }
        book.available_quantity -= 1;

        let now = Utc::now();
        let created = Borrow {
            id: Uuid::new_v4(),
            student_id: borrow.student_id,
            book_id: borrow.book_id,
            borrow_date: now,
            due_date: borrow.due_date,
            return_date: None,
            status: BorrowStatus::Borrowed,
            created_at: now,
        };
        state.borrows.push(created.clone());
        Ok(created)
    }

    async fn mark_returned(&self, id: Uuid) -> AppResult<Borrow> {
        let mut state = self.state.write().await;
        let borrow = state
            .borrows
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Borrow with id {} not found", id)))?;

        if borrow.status == BorrowStatus::Returned {
            return Err(AppError::AlreadyReturned(
                "Borrow has already been returned".to_string(),
            ));
        }
        borrow.status = BorrowStatus::Returned;
        borrow.return_date = Some(Utc::now());
        let returned = borrow.clone();

        let book = state.book_mut(returned.book_id)?;
        if book.available_quantity < book.quantity {
            book.available_quantity += 1;
        } else {
            tracing::warn!(
                "Book {} already has every copy available, count left unchanged",
                book.id
            );
        }

        Ok(returned)
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_account(&self, email: &str, password_hash: &str) -> AppResult<Account> {
        let mut state = self.state.write().await;
        if state.accounts.iter().any(|a| a.email.eq_ignore_ascii_case(email)) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_account(&self, id: Uuid) -> AppResult<Account> {
        let state = self.state.read().await;
        state
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Account with id {} not found", id)))
    }

    async fn create_session(&self, account_id: Uuid, expires_at: DateTime<Utc>) -> AppResult<Session> {
        let mut state = self.state.write().await;
        let session = Session {
            id: Uuid::new_v4(),
            account_id,
            created_at: Utc::now(),
            expires_at,
        };
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> AppResult<Option<Session>> {
        let state = self.state.read().await;
        Ok(state.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.sessions.remove(&id);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - state.sessions.len()) as u64)
    }

    async fn is_admin(&self, account_id: Uuid) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.admins.contains(&account_id))
    }

    async fn grant_admin(&self, account_id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.admins.insert(account_id);
        Ok(())
    }
}
