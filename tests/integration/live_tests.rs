//! Tests against a running server

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Register a throwaway account and return its bearer token
async fn get_auth_token(client: &Client) -> String {
    let email = format!("live-{}@college.edu", uuid::Uuid::new_v4());
    let credentials = json!({
        "email": email,
        "password": "live-pass"
    });

    client
        .post(format!("{}/auth/sign-up", BASE_URL))
        .json(&credentials)
        .send()
        .await
        .expect("Failed to send sign-up request");

    let response = client
        .post(format!("{}/auth/sign-in", BASE_URL))
        .json(&credentials)
        .send()
        .await
        .expect("Failed to send sign-in request");

    let body: Value = response.json().await.expect("Failed to parse sign-in response");
    body["token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_sign_in_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/sign-in", BASE_URL))
        .json(&json!({
            "email": "nobody@college.edu",
            "password": "wrong-pass"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_students_require_admin() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/students", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/shell", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["state"]["view"], "login");
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/borrows", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
