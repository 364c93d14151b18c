//! Data models for the campus library

pub mod account;
pub mod book;
pub mod borrow;
pub mod shell;
pub mod student;

// Re-export commonly used types
pub use account::{Account, Credentials, Session, SessionClaims};
pub use book::{Book, BookInput, NewBook};
pub use borrow::{Borrow, BorrowDetails, BorrowStatus, CreateBorrow};
pub use student::{Student, StudentInput};
