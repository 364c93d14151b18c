//! Book inventory service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{Book, BookInput, NewBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books, newest first
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get(id).await
    }

    pub async fn create(&self, book: NewBook) -> AppResult<Book> {
        let book = BookInput::from(book).normalized();
        book.validate()?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!(
            "Book {} created: {} copies of \"{}\"",
            created.id,
            created.quantity,
            created.title
        );
        Ok(created)
    }

    /// Replace every editable field, availability included
    pub async fn update(&self, id: Uuid, book: BookInput) -> AppResult<Book> {
        let book = book.normalized();
        book.validate()?;

        self.repository.books.update(id, &book).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Book {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn new_book(available: Option<i32>) -> NewBook {
        NewBook {
            title: "  Database System Concepts ".to_string(),
            author: "Korth".to_string(),
            isbn: Some(" ".to_string()),
            quantity: 3,
            available_quantity: available,
        }
    }

    #[tokio::test]
    async fn create_normalizes_and_defaults_availability() {
        let service = BooksService::new(Repository::in_memory());

        let book = service.create(new_book(None)).await.unwrap();
        assert_eq!(book.title, "Database System Concepts");
        assert_eq!(book.isbn, None);
        assert_eq!(book.available_quantity, 3);
    }

    #[tokio::test]
    async fn update_rejects_availability_above_quantity() {
        let service = BooksService::new(Repository::in_memory());
        let book = service.create(new_book(Some(1))).await.unwrap();

        let result = service
            .update(
                book.id,
                BookInput {
                    title: book.title.clone(),
                    author: book.author.clone(),
                    isbn: None,
                    quantity: 2,
                    available_quantity: 5,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(service.get(book.id).await.unwrap().available_quantity, 1);
    }
}
