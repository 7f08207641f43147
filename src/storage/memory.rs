// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory object store.
//!
//! Non-persistent blob storage using DashMap. All data is lost when the
//! process exits.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{ObjectStore, StorageError};

/// Entry stored in the memory backend.
#[derive(Clone)]
struct MemoryObject {
    data: Vec<u8>,
    content_type: String,
    download_token: String,
}

/// In-memory object store keyed by path.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, MemoryObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored bytes and content type for a path.
    pub fn get(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .get(path)
            .map(|o| (o.data.clone(), o.content_type.clone()))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
        _auth_token: &str,
    ) -> Result<(), StorageError> {
        let content_type = if content_type.is_empty() {
            mime_guess::from_path(path)
                .first()
                .map(|mime| mime.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string())
        } else {
            content_type.to_string()
        };

        // Overwrites keep a fresh token, like a re-upload does.
        self.objects.insert(
            path.to_string(),
            MemoryObject {
                data: data.to_vec(),
                content_type,
                download_token: Uuid::new_v4().to_string(),
            },
        );
        Ok(())
    }

    async fn download_url(&self, path: &str, _auth_token: &str) -> Result<String, StorageError> {
        let object = self
            .objects
            .get(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;

        Ok(format!(
            "memory:///{}?token={}",
            urlencoding::encode(path),
            object.download_token
        ))
    }

    async fn delete(&self, path: &str, _auth_token: &str) -> Result<(), StorageError> {
        self.objects
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}
