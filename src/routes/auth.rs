// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email + password authentication routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, session_uid, SESSION_COOKIE};
use crate::models::{Identity, Registration};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Session issued after sign-in or sign-up.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    /// Same token as the session cookie, for Bearer clients
    pub token: String,
    pub identity: Identity,
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Mint the session JWT and attach it as a cookie.
fn start_session(
    state: &AppState,
    jar: CookieJar,
    identity: Identity,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let token = create_jwt(&identity.uid, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let secure = state.config.frontend_url.starts_with("https://");
    let jar = jar.add(session_cookie(token.clone(), secure));

    Ok((jar, Json(SessionResponse { token, identity })))
}

/// Create an account and sign it in.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: std::result::Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let Json(form) = payload?;
    let identity = state.sessions.register(form).await?;
    let (jar, body) = start_session(&state, jar, identity)?;
    Ok((StatusCode::CREATED, jar, body))
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let Json(req) = payload?;
    let identity = state.sessions.login(&req.email, &req.password).await?;
    start_session(&state, jar, identity)
}

/// Sign out and clear the session cookie. Without a session this only
/// clears the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(StatusCode, CookieJar)> {
    if let Some(uid) = session_uid(&jar, &headers, &state.config.jwt_signing_key) {
        state.sessions.logout(&uid).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((StatusCode::NO_CONTENT, jar))
}
