// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without a live session
//! 2. Register, login and logout drive the session lifecycle
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use ecotrack::middleware::auth::{create_jwt, SESSION_COOKIE};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, empty_request, json_request, registration, sign_up};

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(empty_request("GET", "/api/me", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(empty_request("GET", "/api/me", Some("invalid.token.here")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_valid_jwt_without_session_is_rejected() {
    let (app, state, _) = create_test_app();
    // Correctly signed, but this uid never signed in.
    let token = create_jwt("ghost", &state.config.jwt_signing_key).unwrap();

    let response = app
        .oneshot(empty_request("GET", "/api/me", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_then_me() {
    let (app, state, _) = create_test_app();
    let token = sign_up(&app, "lucia@example.com").await;

    assert_eq!(state.sessions.signed_in_count(), 1);

    let response = app
        .oneshot(empty_request("GET", "/api/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["email"], "lucia@example.com");
    assert_eq!(body["display_name"], "Lucía Quispe");
}

#[tokio::test]
async fn test_register_sets_session_cookie() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &registration("cookie@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    // test_default() uses an http:// frontend
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let (app, _, _) = create_test_app();
    let token = sign_up(&app, "jar@example.com").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let (app, _, _) = create_test_app();

    let mut form = registration("not-an-email");
    form["confirm_password"] = json!("different");
    form["dni"] = json!("123");

    let response = app
        .oneshot(json_request("POST", "/auth/register", None, &form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_failed");
    let fields = body["fields"].as_object().unwrap();
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("confirm_password"));
    assert!(fields.contains_key("dni"));
    assert!(!fields.contains_key("name"));
}

#[tokio::test]
async fn test_register_absent_fields_are_reported() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &json!({ "email": "solo@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    let fields = body["fields"].as_object().unwrap();
    assert!(fields.contains_key("name"));
    assert!(fields.contains_key("password"));
    assert!(fields.contains_key("dni"));
    assert!(!fields.contains_key("email"));
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, _, _) = create_test_app();
    sign_up(&app, "twice@example.com").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &registration("twice@example.com"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_flow() {
    let (app, _, _) = create_test_app();
    sign_up(&app, "login@example.com").await;

    let wrong = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            &json!({ "email": "login@example.com", "password": "nope-nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong).await["error"], "invalid_credentials");

    let right = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            &json!({ "email": "login@example.com", "password": "secreto1" }),
        ))
        .await
        .unwrap();
    assert_eq!(right.status(), StatusCode::OK);
    let body = body_json(right).await;
    assert_eq!(body["identity"]["email"], "login@example.com");
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            &json!({ "email": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["fields"]["email"].is_string());
    assert!(body["fields"]["password"].is_string());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (app, state, _) = create_test_app();
    let token = sign_up(&app, "bye@example.com").await;

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/auth/logout", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.sessions.signed_in_count(), 0);

    // The JWT is still well-formed, but its session is gone.
    let response = app
        .oneshot(empty_request("GET", "/api/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_is_noop() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(empty_request("POST", "/auth/logout", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_profile_read_and_update() {
    let (app, _, _) = create_test_app();
    let token = sign_up(&app, "perfil@example.com").await;

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/api/me/profile", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["name"], "Lucía");
    assert_eq!(profile["dni"], "45678912");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/me/profile",
            Some(&token),
            &json!({ "phone": "912345678" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["phone"], "912345678");
    assert_eq!(profile["surname"], "Quispe");

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/me/profile",
            Some(&token),
            &json!({ "email": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/resources")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(empty_request("GET", "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "memory");
}
