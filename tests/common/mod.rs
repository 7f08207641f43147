// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use ecotrack::config::Config;
use ecotrack::db::MemoryDb;
use ecotrack::routes::create_router;
use ecotrack::services::MemoryIdentityProvider;
use ecotrack::storage::MemoryObjectStore;
use ecotrack::{AppState, Backends};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// In-memory backends, with handles kept for inspection.
#[allow(dead_code)]
pub struct TestBackends {
    pub db: Arc<MemoryDb>,
    pub objects: Arc<MemoryObjectStore>,
}

/// Create a test app on in-memory backends.
/// Returns the router, the shared state and the backing stores.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, TestBackends) {
    let db = Arc::new(MemoryDb::new());
    let objects = Arc::new(MemoryObjectStore::new());

    let backends = Backends {
        identity: Arc::new(MemoryIdentityProvider::new()),
        resources: db.clone(),
        files: db.clone(),
        profiles: db.clone(),
        objects: objects.clone(),
    };

    let state = AppState::new(Config::test_default(), backends);
    (
        create_router(state.clone()),
        state,
        TestBackends { db, objects },
    )
}

/// Create a test app from explicit backends.
#[allow(dead_code)]
pub fn create_test_app_with(backends: Backends) -> (axum::Router, Arc<AppState>) {
    let state = AppState::new(Config::test_default(), backends);
    (create_router(state.clone()), state)
}

/// A registration body that passes validation.
#[allow(dead_code)]
pub fn registration(email: &str) -> Value {
    serde_json::json!({
        "name": "Lucía",
        "surname": "Quispe",
        "email": email,
        "password": "secreto1",
        "confirm_password": "secreto1",
        "phone": "987654321",
        "birth_date": "1995-04-12",
        "dni": "45678912"
    })
}

/// Build a JSON request, optionally with a Bearer session token.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a body-less request, optionally with a Bearer session token.
#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user through the API and return their session token.
#[allow(dead_code)]
pub async fn sign_up(app: &axum::Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &registration(email),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

#[allow(dead_code)]
pub const BOUNDARY: &str = "ecotrack-test-boundary";

/// Multipart upload body with a category and any number of files.
#[allow(dead_code)]
pub fn multipart_body(category: Option<&str>, files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(category) = category {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"category\"\r\n\r\n{category}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, content_type, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Build a multipart upload request.
#[allow(dead_code)]
pub fn upload_request(token: &str, category: Option<&str>, files: &[(&str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/files")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(category, files)))
        .unwrap()
}
