//! API handlers for the campus library REST endpoints

pub mod auth;
pub mod books;
pub mod borrows;
pub mod health;
pub mod openapi;
pub mod shell;
pub mod students;

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Deserialize;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::AuthConfig, error::AppError, models::SessionClaims, AppState};

/// Extractor for a signed-in account, from its bearer token
pub struct CurrentSession(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::Authentication("Missing or invalid authorization header".to_string())
                })?;

        let claims = state.services.auth.authenticate(bearer.token()).await?;

        Ok(CurrentSession(claims))
    }
}

/// Extractor for a signed-in account on the admin allow-list
pub struct AdminSession(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentSession(claims) = CurrentSession::from_request_parts(parts, state).await?;
        state.services.auth.require_admin(&claims).await?;

        Ok(AdminSession(claims))
    }
}

/// Deletes are refused unless the caller confirms them
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub confirm: Option<bool>,
}

impl DeleteParams {
    pub fn require_confirmation(&self) -> Result<(), AppError> {
        if self.confirm.unwrap_or(false) {
            Ok(())
        } else {
            Err(AppError::BadRequest(
                "Deletion must be confirmed with confirm=true".to_string(),
            ))
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Identity
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/auth/session", get(auth::session))
        .route("/shell", get(shell::get_shell))
        // Students
        .route("/students", get(students::list_students).post(students::create_student))
        .route(
            "/students/:id",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Borrows
        .route("/borrows", get(borrows::list_borrows).post(borrows::create_borrow))
        .route("/borrows/options", get(borrows::borrow_options))
        .route("/borrows/:id", get(borrows::get_borrow))
        .route("/borrows/:id/return", post(borrows::return_borrow))
        .merge(sign_in_routes(&state.config.auth))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Sign-in route, rate limited per client address when configured
fn sign_in_routes(config: &AuthConfig) -> Router<AppState> {
    let routes = Router::new().route("/auth/sign-in", post(auth::sign_in));

    if config.sign_in_per_second == 0 {
        return routes;
    }

    // The builder takes the interval between two replenished attempts
    let governor = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_millisecond(replenish_interval_ms(config.sign_in_per_second))
        .burst_size(config.sign_in_burst)
        .finish();

    match governor {
        Some(governor) => routes.layer(GovernorLayer {
            config: Arc::new(governor),
        }),
        None => {
            tracing::warn!("Invalid sign-in rate limit settings, limiter disabled");
            routes
        }
    }
}

/// Milliseconds between two replenished attempts for a rate of `per_second`
fn replenish_interval_ms(per_second: u64) -> u64 {
    (1000 / per_second.max(1)).max(1)
}
