//! Navigation shell endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::shell::ShellView, AppState};

use super::CurrentSession;

/// View to render for the caller: login form or management pages
#[utoipa::path(
    get,
    path = "/shell",
    tag = "shell",
    responses(
        (status = 200, description = "Shell view for the current session", body = ShellView)
    )
)]
pub async fn get_shell(
    State(state): State<AppState>,
    session: Option<CurrentSession>,
) -> AppResult<Json<ShellView>> {
    let claims = session.map(|CurrentSession(claims)| claims);
    let view = state.services.auth.shell_view(claims.as_ref()).await?;
    Ok(Json(view))
}
