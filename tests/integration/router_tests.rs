//! In-process API tests against the in-memory backend

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use campus_library_server::{
    api,
    config::{AppConfig, DatabaseBackend},
    repository::Repository,
    AppState,
};

const ADMIN_EMAIL: &str = "admin@college.edu";
const PASSWORD: &str = "library-pass";

fn app() -> Router {
    app_with_sign_in_limit(0, 0)
}

fn app_with_sign_in_limit(per_second: u64, burst: u32) -> Router {
    let mut config = AppConfig::default();
    config.database.backend = DatabaseBackend::Memory;
    config.auth.sign_in_per_second = per_second;
    config.auth.sign_in_burst = burst;
    config.auth.bootstrap_admins = vec![ADMIN_EMAIL.to_string()];

    api::create_router(AppState::new(config, Repository::in_memory()))
}

async fn sign_in_from(app: &Router, client: &str) -> StatusCode {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/sign-in")
        .header("x-forwarded-for", client)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "nobody@college.edu", "password": PASSWORD }).to_string(),
        ))
        .unwrap();

    app.clone().oneshot(request).await.unwrap().status()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri));

    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn sign_up_and_in(app: &Router, email: &str) -> String {
    let credentials = json!({ "email": email, "password": PASSWORD });

    let (status, _) = send(app, Method::POST, "/auth/sign-up", None, Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, Method::POST, "/auth/sign-in", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");

    body["token"].as_str().unwrap().to_string()
}

async fn create_student(app: &Router, token: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/students",
        Some(token),
        Some(json!({
            "name": "Kiran Patel",
            "email": "kiran@college.edu",
            "phone": null,
            "branch": "Computer Science",
            "semester": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn create_book(app: &Router, token: &str, quantity: i32) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(token),
        Some(json!({
            "title": "The C Programming Language",
            "author": "Kernighan and Ritchie",
            "isbn": "0-13-110362-8",
            "quantity": quantity
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["available_quantity"], quantity);
    body["id"].as_str().unwrap().to_string()
}

async fn available(app: &Router, token: &str, book_id: &str) -> i64 {
    let (status, body) = send(app, Method::GET, &format!("/books/{}", book_id), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body["available_quantity"].as_i64().unwrap()
}

fn due_in(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (_, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_management_requires_session() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/students", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");

    let (status, body) = send(&app, Method::GET, "/shell", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["view"], "login");
}

#[tokio::test]
async fn test_non_admin_sees_login_shell() {
    let app = app();
    let token = sign_up_and_in(&app, "visitor@college.edu").await;

    let (status, body) = send(&app, Method::GET, "/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin"], false);
    assert!(body["account"].get("password_hash").is_none());

    let (status, _) = send(&app, Method::GET, "/books", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = send(&app, Method::GET, "/shell", Some(&token), None).await;
    assert_eq!(body["state"]["view"], "login");
}

#[tokio::test]
async fn test_admin_shell_and_sign_out() {
    let app = app();
    let token = sign_up_and_in(&app, ADMIN_EMAIL).await;

    let (_, body) = send(&app, Method::GET, "/shell", Some(&token), None).await;
    assert_eq!(body["state"]["view"], "management");
    assert_eq!(body["state"]["page"], "borrow");
    assert_eq!(body["navigation"].as_array().unwrap().len(), 3);

    let (status, _) = send(&app, Method::POST, "/auth/sign-out", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_sign_up_conflicts() {
    let app = app();
    sign_up_and_in(&app, "twice@college.edu").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/sign-up",
        None,
        Some(json!({ "email": "TWICE@college.edu", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let app = app();
    let token = sign_up_and_in(&app, ADMIN_EMAIL).await;
    let student_id = create_student(&app, &token).await;
    let book_id = create_book(&app, &token, 3).await;

    let (status, borrow) = send(
        &app,
        Method::POST,
        "/borrows",
        Some(&token),
        Some(json!({ "student_id": student_id, "book_id": book_id, "due_date": due_in(14) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(borrow["status"], "borrowed");
    assert_eq!(borrow["student"]["name"], "Kiran Patel");
    assert_eq!(borrow["is_overdue"], false);
    assert_eq!(available(&app, &token, &book_id).await, 2);

    let (_, borrows) = send(&app, Method::GET, "/borrows?status=borrowed", Some(&token), None).await;
    assert_eq!(borrows.as_array().unwrap().len(), 1);

    let borrow_id = borrow["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/borrows/{}/return", borrow_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "returned");
    assert_eq!(body["borrow"]["status"], "returned");
    assert!(body["borrow"]["return_date"].is_string());
    assert_eq!(available(&app, &token, &book_id).await, 3);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/borrows/{}/return", borrow_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AlreadyReturned");
    assert_eq!(available(&app, &token, &book_id).await, 3);
}

#[tokio::test]
async fn test_borrow_rules() {
    let app = app();
    let token = sign_up_and_in(&app, ADMIN_EMAIL).await;
    let student_id = create_student(&app, &token).await;
    let book_id = create_book(&app, &token, 1).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/borrows",
        Some(&token),
        Some(json!({ "student_id": student_id, "book_id": book_id, "due_date": due_in(-1) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = json!({ "student_id": student_id, "book_id": book_id, "due_date": due_in(0) });
    let (status, _) = send(&app, Method::POST, "/borrows", Some(&token), Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/borrows", Some(&token), Some(request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "This book is not available for borrowing.");

    let (_, options) = send(&app, Method::GET, "/borrows/options", Some(&token), None).await;
    assert!(options["books"].as_array().unwrap().is_empty());
    assert_eq!(options["default_due_date"], due_in(14));
}

#[tokio::test]
async fn test_delete_requires_confirmation_and_no_borrows() {
    let app = app();
    let token = sign_up_and_in(&app, ADMIN_EMAIL).await;
    let student_id = create_student(&app, &token).await;
    let borrowed_book = create_book(&app, &token, 2).await;
    let spare_book = create_book(&app, &token, 1).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/borrows",
        Some(&token),
        Some(json!({ "student_id": student_id, "book_id": borrowed_book, "due_date": due_in(7) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, Method::DELETE, &format!("/books/{}", spare_book), Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/students/{}?confirm=true", student_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "StillReferenced");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/books/{}?confirm=true", spare_book),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, books) = send(&app, Method::GET, "/books", Some(&token), None).await;
    assert_eq!(books.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_student_validation() {
    let app = app();
    let token = sign_up_and_in(&app, ADMIN_EMAIL).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/students",
        Some(&token),
        Some(json!({
            "name": "Nisha",
            "email": "not-an-email",
            "branch": "Physics",
            "semester": 9
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_sign_in_rate_is_attempts_per_second() {
    // 4 per second with a burst of 1: one attempt every 250ms per client
    let app = app_with_sign_in_limit(4, 1);

    assert_eq!(sign_in_from(&app, "203.0.113.7").await, StatusCode::UNAUTHORIZED);
    assert_eq!(sign_in_from(&app, "203.0.113.7").await, StatusCode::TOO_MANY_REQUESTS);

    // Other clients have their own quota
    assert_eq!(sign_in_from(&app, "198.51.100.2").await, StatusCode::UNAUTHORIZED);

    tokio::time::sleep(std::time::Duration::from_millis(350)).await;
    assert_eq!(sign_in_from(&app, "203.0.113.7").await, StatusCode::UNAUTHORIZED);
}
