//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, borrows, health, shell, students};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus Library API",
        version = "0.3.0",
        description = "Student, book and borrow administration REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Identity
        auth::sign_up,
        auth::sign_in,
        auth::sign_out,
        auth::session,
        shell::get_shell,
        // Students
        students::list_students,
        students::get_student,
        students::create_student,
        students::update_student,
        students::delete_student,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrows
        borrows::list_borrows,
        borrows::borrow_options,
        borrows::get_borrow,
        borrows::create_borrow,
        borrows::return_borrow,
    ),
    components(
        schemas(
            // Identity
            crate::models::account::Account,
            crate::models::account::Credentials,
            crate::services::auth::SessionInfo,
            auth::SignInResponse,
            crate::models::shell::Page,
            crate::models::shell::ShellState,
            crate::models::shell::NavEntry,
            crate::models::shell::ShellView,
            // Students
            crate::models::student::Student,
            crate::models::student::StudentInput,
            // Books
            crate::models::book::Book,
            crate::models::book::NewBook,
            crate::models::book::BookInput,
            // Borrows
            crate::models::borrow::BorrowStatus,
            crate::models::borrow::Borrow,
            crate::models::borrow::BorrowDetails,
            crate::models::borrow::CreateBorrow,
            crate::models::borrow::BorrowQuery,
            crate::models::borrow::BorrowOptions,
            borrows::ReturnResponse,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Sign-up, sign-in and sessions"),
        (name = "shell", description = "Navigation shell"),
        (name = "students", description = "Student records"),
        (name = "books", description = "Book inventory"),
        (name = "borrows", description = "Borrowing and returns")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
