// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Carbon footprint questionnaire routes. These are public.

use crate::error::{AppError, Result};
use crate::models::footprint::{AnswerKind, Step};
use crate::models::FootprintResult;
use crate::services::footprint::{parse_answers, parse_step, score};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/footprint", post(calculate))
        .route("/api/footprint/validate", post(validate_step))
        .route("/api/footprint/questions", get(questions))
}

/// Flatten a JSON body into form strings. Numbers and booleans are
/// accepted as well as strings; null counts as missing.
fn form_from_json(body: HashMap<String, Value>) -> HashMap<String, String> {
    body.into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => return None,
                other => other.to_string(),
            };
            Some((key, value))
        })
        .collect()
}

/// Score a complete questionnaire.
async fn calculate(
    payload: std::result::Result<Json<HashMap<String, Value>>, JsonRejection>,
) -> Result<Json<FootprintResult>> {
    let Json(body) = payload?;
    let answers = parse_answers(&form_from_json(body)).map_err(AppError::Validation)?;
    let result = score(&answers);
    tracing::debug!(total = result.total, rating = ?result.rating, "Footprint scored");
    Ok(Json(result))
}

#[derive(Deserialize)]
pub struct StepQuery {
    step: String,
}

#[derive(Serialize)]
pub struct StepValidation {
    pub step: Step,
    /// `None` once the last step is valid and the result can be shown
    pub next_step: Option<Step>,
}

/// Validate one wizard step.
async fn validate_step(
    Query(query): Query<StepQuery>,
    payload: std::result::Result<Json<HashMap<String, Value>>, JsonRejection>,
) -> Result<Json<StepValidation>> {
    let Json(body) = payload?;
    let step: Step = query.step.parse().map_err(AppError::BadRequest)?;
    parse_step(step, &form_from_json(body)).map_err(AppError::Validation)?;
    Ok(Json(StepValidation {
        step,
        next_step: step.next(),
    }))
}

#[derive(Serialize)]
pub struct QuestionInfo {
    pub key: &'static str,
    pub prompt: &'static str,
    /// `number` or `yes_no`
    pub kind: &'static str,
    pub unit: Option<&'static str>,
}

#[derive(Serialize)]
pub struct StepInfo {
    pub step: Step,
    pub questions: Vec<QuestionInfo>,
}

/// Questionnaire layout for clients that render the wizard.
async fn questions() -> Json<Vec<StepInfo>> {
    let steps = Step::ALL
        .into_iter()
        .map(|step| StepInfo {
            step,
            questions: step
                .questions()
                .into_iter()
                .map(|q| {
                    let (kind, unit) = match q.kind() {
                        AnswerKind::Number { unit } => ("number", Some(unit)),
                        AnswerKind::YesNo => ("yes_no", None),
                    };
                    QuestionInfo {
                        key: q.key(),
                        prompt: q.prompt(),
                        kind,
                        unit,
                    }
                })
                .collect(),
        })
        .collect();
    Json(steps)
}
