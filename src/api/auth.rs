//! Sign-up, sign-in and session endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{Account, Credentials},
    services::auth::SessionInfo,
    AppState,
};

use super::CurrentSession;

/// Sign-in response
#[derive(Serialize, ToSchema)]
pub struct SignInResponse {
    /// JWT bearer token
    pub token: String,
    pub token_type: String,
    pub account: Account,
    /// Whether the account may use the management endpoints
    pub is_admin: bool,
}

/// Create an account
#[utoipa::path(
    post,
    path = "/auth/sign-up",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid email or password too short"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> AppResult<(StatusCode, Json<Account>)> {
    let account = state.services.auth.sign_up(credentials).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many attempts")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> AppResult<Json<SignInResponse>> {
    let (token, session) = state.services.auth.sign_in(credentials).await?;

    Ok(Json(SignInResponse {
        token,
        token_type: "Bearer".to_string(),
        account: session.account,
        is_admin: session.is_admin,
    }))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    CurrentSession(claims): CurrentSession,
) -> AppResult<StatusCode> {
    state.services.auth.sign_out(&claims).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current account and admin flag
#[utoipa::path(
    get,
    path = "/auth/session",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current session", body = SessionInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn session(
    State(state): State<AppState>,
    CurrentSession(claims): CurrentSession,
) -> AppResult<Json<SessionInfo>> {
    let info = state.services.auth.current_session(&claims).await?;
    Ok(Json(info))
}
