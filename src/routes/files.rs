// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File routes: list, multipart upload, delete and download redirect.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::file::{count_by_category, format_file_size, FileFilter};
use crate::models::{FileCategory, FileRecord, FileUpload};
use crate::time_utils::format_display_date;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Largest accepted upload request.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/files", get(list_files).post(upload_files))
        .route("/api/files/{id}", delete(delete_file))
        .route("/api/files/{id}/download", get(download_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// File plus display fields.
#[derive(Serialize)]
pub struct FileResponse {
    #[serde(flatten)]
    pub file: FileRecord,
    pub size_label: String,
    pub uploaded_on: String,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            size_label: format_file_size(file.size_bytes),
            uploaded_on: format_display_date(file.uploaded_at),
            file,
        }
    }
}

#[derive(Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    /// Counts over all of the user's files, ignoring the filter
    pub counts: BTreeMap<FileCategory, usize>,
}

async fn list_files(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<FileFilter>,
) -> Result<Json<FileListResponse>> {
    let all = state.files.list(&user.uid, &FileFilter::default()).await?;
    let counts = count_by_category(&all);
    let files = filter.apply(all).into_iter().map(FileResponse::from).collect();

    Ok(Json(FileListResponse { files, counts }))
}

/// Multipart upload: one `category` text field and any number of `files`.
async fn upload_files(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<FileResponse>>)> {
    let mut category: Option<String> = None;
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "category" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                category = Some(value);
            }
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                uploads.push(FileUpload {
                    name: file_name,
                    mime_type,
                    data: data.to_vec(),
                });
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let category: FileCategory = match category.as_deref().map(str::trim) {
        None | Some("") => return Err(AppError::field("category", "Select a category")),
        Some(value) => value
            .parse()
            .map_err(|_| AppError::field("category", "Unknown category"))?,
    };

    let auth_token = state.sessions.id_token(&user.uid).await?;
    let records = state
        .files
        .upload(&user.uid, &auth_token, category, uploads)
        .await?;
    state.snapshots.refresh_after_change(&user.uid).await;

    Ok((
        StatusCode::CREATED,
        Json(records.into_iter().map(FileResponse::from).collect()),
    ))
}

#[derive(Serialize)]
pub struct DeleteFileResponse {
    /// Metadata documents removed (all entries sharing the file's name)
    pub removed: usize,
}

async fn delete_file(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteFileResponse>> {
    let auth_token = state.sessions.id_token(&user.uid).await?;
    let removed = state.files.delete(&user.uid, &auth_token, &id).await?;
    state.snapshots.refresh_after_change(&user.uid).await;
    Ok(Json(DeleteFileResponse { removed }))
}

/// Redirect to a freshly resolved download URL.
async fn download_file(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let auth_token = state.sessions.id_token(&user.uid).await?;
    let url = state.files.download_url(&user.uid, &auth_token, &id).await?;
    Ok(Redirect::temporary(&url))
}
