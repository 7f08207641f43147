// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in user: identity, profile and dashboard.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileUpdate, UserProfile};
use crate::services::snapshot::DashboardSummary;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/profile", get(get_profile).put(update_profile))
        .route("/api/dashboard", get(get_dashboard))
}

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub member_since: String,
}

async fn get_me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    let identity = user.identity;
    Json(MeResponse {
        uid: identity.uid,
        email: identity.email,
        display_name: identity.display_name,
        member_since: format_utc_rfc3339(identity.created_at),
    })
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.sessions.profile(&user.uid).await?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<UserProfile>> {
    let Json(update) = payload?;
    Ok(Json(state.sessions.update_profile(&user.uid, update).await?))
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardSummary>> {
    Ok(Json(state.snapshots.summary(&user.uid).await?))
}
