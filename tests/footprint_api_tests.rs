// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Footprint questionnaire API tests. These routes need no session.

use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, empty_request, json_request};

fn golden_answers() -> Value {
    json!({
        "carMiles": 150,
        "flightHours": 10,
        "publicTransport": 5,
        "electricity": 300,
        "heating": 80,
        "renewable": false,
        "meat": 4,
        "local": 60,
        "organic": false,
        "recycling": 70,
        "composting": false,
        "plastic": 3
    })
}

#[tokio::test]
async fn test_golden_vector() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(json_request("POST", "/api/footprint", None, &golden_answers()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result = body_json(response).await;
    assert_eq!(result["total"], 1.2);
    assert_eq!(result["categories"]["transport"], 9.3);
    assert_eq!(result["categories"]["energy"], 2.1);
    assert_eq!(result["categories"]["food"], 0.2);
    assert_eq!(result["categories"]["waste"], 0.0);
    assert_eq!(result["rating"], "excellent");
    assert_eq!(result["trees_to_offset"], 48);

    let tips = result["tips"].as_array().unwrap();
    assert_eq!(tips.len(), 1);
    assert!(tips[0].as_str().unwrap().contains("transporte público"));
}

#[tokio::test]
async fn test_string_answers_are_accepted() {
    let (app, _, _) = create_test_app();

    let mut answers = golden_answers();
    answers["carMiles"] = json!("150");
    answers["renewable"] = json!("no");
    answers["organic"] = json!("sí");

    let response = app
        .oneshot(json_request("POST", "/api/footprint", None, &answers))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Organic lowers food by 100 kg, which only clamps the category at 0.
    let result = body_json(response).await;
    assert_eq!(result["categories"]["food"], 0.0);
    assert_eq!(result["categories"]["transport"], 9.3);
}

#[tokio::test]
async fn test_missing_answers_reported_per_field() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(json_request("POST", "/api/footprint", None, &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    let fields = body["fields"].as_object().unwrap();
    assert_eq!(fields.len(), 12);
    assert!(fields.contains_key("carMiles"));
    assert!(fields.contains_key("plastic"));
}

#[tokio::test]
async fn test_invalid_values_rejected() {
    let (app, _, _) = create_test_app();

    let mut answers = golden_answers();
    answers["carMiles"] = json!(-1);
    answers["recycling"] = json!(120);
    answers["composting"] = json!("maybe");

    let response = app
        .oneshot(json_request("POST", "/api/footprint", None, &answers))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    let fields = body["fields"].as_object().unwrap();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields["carMiles"], "Must not be negative");
    assert_eq!(fields["recycling"], "Must be between 0 and 100");
    assert_eq!(fields["composting"], "Answer yes or no");
}

#[tokio::test]
async fn test_validate_step_advances() {
    let (app, _, _) = create_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/footprint/validate?step=transport",
            None,
            &json!({ "carMiles": 10, "flightHours": 0, "publicTransport": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["step"], "transport");
    assert_eq!(body["next_step"], "energy");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/footprint/validate?step=waste",
            None,
            &json!({ "recycling": 50, "composting": "si", "plastic": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["next_step"].is_null());
}

#[tokio::test]
async fn test_validate_step_errors() {
    let (app, _, _) = create_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/footprint/validate?step=energy",
            None,
            &json!({ "electricity": "abc", "renewable": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["fields"]["electricity"], "Enter a valid number");
    assert_eq!(body["fields"]["heating"], "This field is required");
    assert!(body["fields"].get("renewable").is_none());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/footprint/validate?step=result",
            None,
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_questions_layout() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(empty_request("GET", "/api/footprint/questions", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let steps = body_json(response).await;
    let steps = steps.as_array().unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[0]["step"], "transport");
    assert_eq!(steps[3]["step"], "waste");
    for step in steps {
        assert_eq!(step["questions"].as_array().unwrap().len(), 3);
    }

    let renewable = &steps[1]["questions"][2];
    assert_eq!(renewable["key"], "renewable");
    assert_eq!(renewable["kind"], "yes_no");
    assert!(renewable["unit"].is_null());
}
