// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Object store for uploaded file blobs.

pub mod firebase;
pub mod memory;

use async_trait::async_trait;

use crate::error::AppError;

pub use firebase::FirebaseStorage;
pub use memory::MemoryObjectStore;

/// Object store errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object store request failed: {0}")]
    Remote(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => AppError::NotFound(format!("File {}", path)),
            StorageError::Remote(msg) => AppError::Storage(msg),
        }
    }
}

/// Blob storage addressed by path.
///
/// `auth_token` is the signed-in user's provider ID token. Security rules
/// on the bucket restrict each user to `users/{uid}/`.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Write a blob, replacing any existing object at `path`.
    async fn put(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
        auth_token: &str,
    ) -> Result<(), StorageError>;

    /// Resolve a current download URL for the object.
    async fn download_url(&self, path: &str, auth_token: &str) -> Result<String, StorageError>;

    /// Delete the object. Missing objects yield [`StorageError::NotFound`].
    async fn delete(&self, path: &str, auth_token: &str) -> Result<(), StorageError>;
}
