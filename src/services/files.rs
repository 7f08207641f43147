// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File catalog: metadata documents plus blobs in the object store.
//!
//! Handles:
//! - Concurrent upload of blob + metadata pairs
//! - Delete by name (every metadata document sharing the name goes)
//! - Fresh download URLs resolved on demand

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;

use crate::db::FileRepository;
use crate::error::{AppError, FieldErrors};
use crate::models::file::{object_path, FileCategory, FileFilter, FileMetadata, FileRecord, FileUpload};
use crate::storage::{ObjectStore, StorageError};

/// Reject names that are blank or would escape the category folder.
fn check_file_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("File name is required");
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err("File name may not contain path separators");
    }
    Ok(())
}

fn content_type_for(upload: &FileUpload) -> String {
    upload
        .mime_type
        .clone()
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            mime_guess::from_path(&upload.name)
                .first()
                .map(|mime| mime.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// A blob + metadata pair that did not produce a record.
struct FailedPair {
    error: AppError,
    /// Object path, when the blob write itself went through.
    written: Option<String>,
}

/// CRUD over user files.
#[derive(Clone)]
pub struct FileCatalog {
    repo: Arc<dyn FileRepository>,
    store: Arc<dyn ObjectStore>,
}

impl FileCatalog {
    pub fn new(repo: Arc<dyn FileRepository>, store: Arc<dyn ObjectStore>) -> Self {
        Self { repo, store }
    }

    /// Files re-queried from the store, narrowed by `filter`.
    pub async fn list(&self, user_id: &str, filter: &FileFilter) -> Result<Vec<FileRecord>, AppError> {
        let files = self.repo.list_files(user_id).await?;
        Ok(filter.apply(files))
    }

    /// Upload files into a category.
    ///
    /// Each file is written to the object store, its download URL resolved
    /// and a metadata document inserted. All files proceed concurrently;
    /// the call fails if any of them fails. Names are not deduplicated, so
    /// re-uploading a name overwrites the blob and adds a second document.
    pub async fn upload(
        &self,
        user_id: &str,
        auth_token: &str,
        category: FileCategory,
        files: Vec<FileUpload>,
    ) -> Result<Vec<FileRecord>, AppError> {
        if files.is_empty() {
            return Err(AppError::field("files", "Select at least one file"));
        }

        let mut errors = FieldErrors::new();
        for file in &files {
            if let Err(msg) = check_file_name(&file.name) {
                errors
                    .entry("files".to_string())
                    .or_insert_with(|| format!("{}: '{}'", msg, file.name));
            }
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        // Every pair runs to completion so each failure knows what it wrote.
        let outcomes = join_all(
            files
                .iter()
                .map(|file| self.upload_one(user_id, auth_token, category, file)),
        )
        .await;

        let mut records = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(failed) => failures.push(failed),
            }
        }

        if !failures.is_empty() {
            let written: Vec<&str> = failures
                .iter()
                .filter_map(|f| f.written.as_deref())
                .collect();
            self.remove_orphaned_blobs(user_id, auth_token, &written)
                .await;

            tracing::warn!(
                user_id,
                category = %category,
                uploaded = records.len(),
                failed = failures.len(),
                "Upload partially failed"
            );
            if let Some(failed) = failures.into_iter().next() {
                return Err(failed.error);
            }
        }

        tracing::info!(
            user_id,
            category = %category,
            count = records.len(),
            "Files uploaded"
        );
        Ok(records)
    }

    async fn upload_one(
        &self,
        user_id: &str,
        auth_token: &str,
        category: FileCategory,
        file: &FileUpload,
    ) -> Result<FileRecord, FailedPair> {
        let path = object_path(user_id, category, &file.name);
        let mime_type = content_type_for(file);

        if let Err(e) = self
            .store
            .put(&path, &file.data, &mime_type, auth_token)
            .await
        {
            return Err(FailedPair {
                error: e.into(),
                written: None,
            });
        }

        match self
            .record_upload(user_id, auth_token, category, file, &path, mime_type)
            .await
        {
            Ok(record) => Ok(record),
            Err(error) => Err(FailedPair {
                error,
                written: Some(path),
            }),
        }
    }

    async fn record_upload(
        &self,
        user_id: &str,
        auth_token: &str,
        category: FileCategory,
        file: &FileUpload,
        path: &str,
        mime_type: String,
    ) -> Result<FileRecord, AppError> {
        let download_url = self.store.download_url(path, auth_token).await?;

        let metadata = FileMetadata {
            name: file.name.clone(),
            mime_type,
            size_bytes: file.data.len() as u64,
            uploaded_at: Utc::now(),
            category,
            download_url,
        };
        self.repo.insert_file(user_id, &metadata).await
    }

    /// Best-effort removal of blobs written by failed pairs.
    ///
    /// A path still referenced by a metadata document (an earlier upload of
    /// the same name, or a sibling pair that succeeded) is kept. If the
    /// documents cannot be listed nothing is removed.
    async fn remove_orphaned_blobs(&self, user_id: &str, auth_token: &str, paths: &[&str]) {
        if paths.is_empty() {
            return;
        }

        let referenced: HashSet<String> = match self.repo.list_files(user_id).await {
            Ok(files) => files
                .iter()
                .map(|f| object_path(user_id, f.category, &f.name))
                .collect(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Cannot list files, leaving blobs in place");
                return;
            }
        };

        let mut removed = HashSet::new();
        for path in paths.iter().copied() {
            if referenced.contains(path) {
                tracing::debug!(path = %path, "Blob still referenced, kept");
                continue;
            }
            if !removed.insert(path) {
                continue;
            }
            if let Err(cleanup) = self.store.delete(path, auth_token).await {
                tracing::warn!(path = %path, error = %cleanup, "Failed to remove orphaned blob");
            }
        }
    }

    /// Delete a file and every metadata document sharing its name.
    ///
    /// Unknown ids are a no-op. A blob that is already gone is not an
    /// error. Returns the number of metadata documents removed.
    pub async fn delete(
        &self,
        user_id: &str,
        auth_token: &str,
        file_id: &str,
    ) -> Result<usize, AppError> {
        let Some(record) = self.repo.find_file(user_id, file_id).await? else {
            tracing::debug!(user_id, file_id, "Delete of unknown file ignored");
            return Ok(0);
        };

        let path = object_path(user_id, record.category, &record.name);
        match self.store.delete(&path, auth_token).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                tracing::warn!(path = %path, "Blob already absent");
            }
            Err(e) => return Err(e.into()),
        }

        let removed = self.repo.delete_files_named(user_id, &record.name).await?;
        tracing::info!(user_id, file_id, name = %record.name, removed, "File deleted");
        Ok(removed)
    }

    /// Resolve a current download URL for one of the user's files.
    pub async fn download_url(
        &self,
        user_id: &str,
        auth_token: &str,
        file_id: &str,
    ) -> Result<String, AppError> {
        let record = self
            .repo
            .find_file(user_id, file_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {}", file_id)))?;

        let path = object_path(user_id, record.category, &record.name);
        Ok(self.store.download_url(&path, auth_token).await?)
    }
}
