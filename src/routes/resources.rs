// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Eco-resource routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{NewResource, Resource, ResourceFilter};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/resources", get(list_resources).post(create_resource))
        .route("/api/resources/{id}", delete(delete_resource))
}

/// Resource plus its map link.
#[derive(Serialize)]
pub struct ResourceResponse {
    #[serde(flatten)]
    pub resource: Resource,
    pub map_link: String,
}

impl From<Resource> for ResourceResponse {
    fn from(resource: Resource) -> Self {
        Self {
            map_link: resource.map_link(),
            resource,
        }
    }
}

async fn list_resources(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<ResourceFilter>,
) -> Result<Json<Vec<ResourceResponse>>> {
    let resources = state.resources.list(&user.uid, &filter).await?;
    Ok(Json(resources.into_iter().map(ResourceResponse::from).collect()))
}

async fn create_resource(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<NewResource>, JsonRejection>,
) -> Result<(StatusCode, Json<ResourceResponse>)> {
    let Json(input) = payload?;
    let resource = state.resources.create(&user.uid, input).await?;
    state.snapshots.refresh_after_change(&user.uid).await;
    Ok((StatusCode::CREATED, Json(resource.into())))
}

async fn delete_resource(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.resources.delete(&user.uid, &id).await?;
    state.snapshots.refresh_after_change(&user.uid).await;
    Ok(StatusCode::NO_CONTENT)
}
