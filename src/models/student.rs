//! Student model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Student record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Academic branch (e.g. "Computer Science")
    pub branch: String,
    /// Current semester, 1 to 8
    pub semester: i16,
    pub created_at: DateTime<Utc>,
}

/// Create or update student request.
///
/// Updates replace every editable field.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StudentInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Branch is required"))]
    pub branch: String,
    #[validate(range(min = 1, max = 8, message = "Semester must be between 1 and 8"))]
    pub semester: i16,
}

impl StudentInput {
    /// Trim text fields; a blank phone becomes `None`
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.branch = self.branch.trim().to_string();
        self.phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self
    }
}
