//! Student management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{Student, StudentInput},
    repository::Repository,
};

#[derive(Clone)]
pub struct StudentsService {
    repository: Repository,
}

impl StudentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List students, newest first
    pub async fn list(&self) -> AppResult<Vec<Student>> {
        self.repository.students.list().await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Student> {
        self.repository.students.get(id).await
    }

    pub async fn create(&self, student: StudentInput) -> AppResult<Student> {
        let student = student.normalized();
        student.validate()?;

        let created = self.repository.students.create(&student).await?;
        tracing::info!("Student {} created ({})", created.id, created.email);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, student: StudentInput) -> AppResult<Student> {
        let student = student.normalized();
        student.validate()?;

        self.repository.students.update(id, &student).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.students.delete(id).await?;
        tracing::info!("Student {} deleted", id);
        Ok(())
    }
}
