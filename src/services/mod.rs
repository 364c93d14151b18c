//! Business logic services

pub mod auth;
pub mod books;
pub mod borrows;
pub mod students;

use crate::{
    config::{AuthConfig, BorrowsConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub students: students::StudentsService,
    pub books: books::BooksService,
    pub borrows: borrows::BorrowsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, borrows_config: BorrowsConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            students: students::StudentsService::new(repository.clone()),
            books: books::BooksService::new(repository.clone()),
            borrows: borrows::BorrowsService::new(repository, borrows_config),
        }
    }
}
