//! Book model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{9}[\dXx]|\d{13})$").expect("valid ISBN pattern"));

/// Book record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    /// Total number of copies owned
    pub quantity: i32,
    /// Copies currently on the shelf
    pub available_quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub quantity: i32,
    /// Defaults to `quantity` when omitted
    pub available_quantity: Option<i32>,
}

impl From<NewBook> for BookInput {
    fn from(book: NewBook) -> Self {
        BookInput {
            available_quantity: book.available_quantity.unwrap_or(book.quantity),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            quantity: book.quantity,
        }
    }
}

/// Validated book fields, used for inserts and full updates
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_availability"))]
pub struct BookInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub available_quantity: i32,
}

impl BookInput {
    /// Trim text fields; a blank ISBN becomes `None`
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.isbn = self
            .isbn
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());
        self
    }
}

fn validate_availability(book: &BookInput) -> Result<(), ValidationError> {
    if book.available_quantity < 0 || book.available_quantity > book.quantity {
        let mut error = ValidationError::new("availability");
        error.message = Some("Available quantity must be between 0 and quantity".into());
        return Err(error);
    }
    Ok(())
}

fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    let digits: String = isbn.chars().filter(|c| *c != '-' && *c != ' ').collect();
    if ISBN_PATTERN.is_match(&digits) {
        Ok(())
    } else {
        let mut error = ValidationError::new("isbn");
        error.message = Some("ISBN must have 10 or 13 digits".into());
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(quantity: i32, available: Option<i32>) -> NewBook {
        NewBook {
            title: "Operating System Concepts".to_string(),
            author: "Silberschatz".to_string(),
            isbn: Some("978-1-118-06333-0".to_string()),
            quantity,
            available_quantity: available,
        }
    }

    #[test]
    fn availability_defaults_to_quantity() {
        let book: BookInput = new_book(4, None).into();
        assert_eq!(book.available_quantity, 4);
        assert!(book.validate().is_ok());
    }

    #[test]
    fn availability_above_quantity_is_rejected() {
        let book: BookInput = new_book(2, Some(3)).into();
        assert!(book.validate().is_err());

        let book: BookInput = new_book(2, Some(-1)).into();
        assert!(book.validate().is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let book: BookInput = new_book(0, Some(0)).into();
        assert!(book.validate().is_err());
    }

    #[test]
    fn isbn_accepts_hyphenated_forms() {
        assert!(validate_isbn("0-306-40615-2").is_ok());
        assert!(validate_isbn("080442957X").is_ok());
        assert!(validate_isbn("978 0 306 40615 7").is_ok());
        assert!(validate_isbn("12345").is_err());
        assert!(validate_isbn("abcdefghij").is_err());
    }
}
