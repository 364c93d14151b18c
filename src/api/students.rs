//! Student management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Student, StudentInput},
    AppState,
};

use super::{AdminSession, DeleteParams};

/// List students, newest first
#[utoipa::path(
    get,
    path = "/students",
    tag = "students",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of students", body = Vec<Student>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_students(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
) -> AppResult<Json<Vec<Student>>> {
    let students = state.services.students.list().await?;
    Ok(Json(students))
}

/// Get student by ID
#[utoipa::path(
    get,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 404, description = "Student not found")
    )
)]
pub async fn get_student(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Student>> {
    let student = state.services.students.get(id).await?;
    Ok(Json(student))
}

/// Create a new student
#[utoipa::path(
    post,
    path = "/students",
    tag = "students",
    security(("bearer_auth" = [])),
    request_body = StudentInput,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
    Json(student): Json<StudentInput>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let created = state.services.students.create(student).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing student
#[utoipa::path(
    put,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    request_body = StudentInput,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Student not found")
    )
)]
pub async fn update_student(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
    Path(id): Path<Uuid>,
    Json(student): Json<StudentInput>,
) -> AppResult<Json<Student>> {
    let updated = state.services.students.update(id, student).await?;
    Ok(Json(updated))
}

/// Delete a student
#[utoipa::path(
    delete,
    path = "/students/{id}",
    tag = "students",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Student ID"),
        ("confirm" = Option<bool>, Query, description = "Must be true")
    ),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 400, description = "Deletion not confirmed"),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Student has borrow records")
    )
)]
pub async fn delete_student(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteParams>,
) -> AppResult<StatusCode> {
    params.require_confirmation()?;

    state.services.students.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
