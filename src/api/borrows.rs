//! Borrow management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        borrow::{BorrowOptions, BorrowQuery},
        BorrowDetails, CreateBorrow,
    },
    AppState,
};

use super::AdminSession;

/// Return response with borrow details
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    pub borrow: BorrowDetails,
}

/// List borrows with student and book, newest first
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(BorrowQuery),
    responses(
        (status = 200, description = "List of borrows", body = Vec<BorrowDetails>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_borrows(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
    Query(query): Query<BorrowQuery>,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    let borrows = state.services.borrows.list(&query).await?;
    Ok(Json(borrows))
}

/// Students, available books and default due date for a new borrow
#[utoipa::path(
    get,
    path = "/borrows/options",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrow form options", body = BorrowOptions)
    )
)]
pub async fn borrow_options(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
) -> AppResult<Json<BorrowOptions>> {
    let options = state.services.borrows.options().await?;
    Ok(Json(options))
}

/// Get borrow by ID
#[utoipa::path(
    get,
    path = "/borrows/{id}",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Borrow details", body = BorrowDetails),
        (status = 404, description = "Borrow not found")
    )
)]
pub async fn get_borrow(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BorrowDetails>> {
    let borrow = state.services.borrows.get(id).await?;
    Ok(Json(borrow))
}

/// Lend a book to a student
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Borrow created", body = BorrowDetails),
        (status = 400, description = "Due date in the past"),
        (status = 404, description = "Student or book not found"),
        (status = 422, description = "No copy available")
    )
)]
pub async fn create_borrow(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
    Json(request): Json<CreateBorrow>,
) -> AppResult<(StatusCode, Json<BorrowDetails>)> {
    let borrow = state.services.borrows.create(request).await?;
    Ok((StatusCode::CREATED, Json(borrow)))
}

/// Mark a borrowed book as returned
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Borrow not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_borrow(
    State(state): State<AppState>,
    AdminSession(_claims): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReturnResponse>> {
    let borrow = state.services.borrows.return_borrow(id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        borrow,
    }))
}
