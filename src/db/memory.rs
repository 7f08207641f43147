// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store.
//!
//! Non-persistent stand-in for Firestore used by tests and
//! `DATA_BACKEND=memory`. Documents keep insertion order per user.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::db::{FileRepository, ProfileRepository, ResourceRepository};
use crate::error::AppError;
use crate::models::file::{FileMetadata, FileRecord};
use crate::models::resource::{Resource, ResourceDraft};
use crate::models::UserProfile;

/// Document store held in process memory, keyed by user id.
#[derive(Default)]
pub struct MemoryDb {
    resources: DashMap<String, Vec<Resource>>,
    files: DashMap<String, Vec<FileRecord>>,
    profiles: DashMap<String, UserProfile>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of file documents stored for a user.
    pub fn file_count(&self, user_id: &str) -> usize {
        self.files.get(user_id).map_or(0, |f| f.len())
    }

    /// Number of resource documents stored for a user.
    pub fn resource_count(&self, user_id: &str) -> usize {
        self.resources.get(user_id).map_or(0, |r| r.len())
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl ResourceRepository for MemoryDb {
    async fn list_resources(&self, user_id: &str) -> Result<Vec<Resource>, AppError> {
        Ok(self
            .resources
            .get(user_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn insert_resource(
        &self,
        user_id: &str,
        draft: &ResourceDraft,
    ) -> Result<Resource, AppError> {
        let resource = draft.clone().with_id(new_id());
        self.resources
            .entry(user_id.to_string())
            .or_default()
            .push(resource.clone());
        Ok(resource)
    }

    async fn delete_resource(&self, user_id: &str, resource_id: &str) -> Result<(), AppError> {
        if let Some(mut resources) = self.resources.get_mut(user_id) {
            resources.retain(|r| r.id != resource_id);
        }
        Ok(())
    }
}

#[async_trait]
impl FileRepository for MemoryDb {
    async fn list_files(&self, user_id: &str) -> Result<Vec<FileRecord>, AppError> {
        Ok(self
            .files
            .get(user_id)
            .map(|f| f.value().clone())
            .unwrap_or_default())
    }

    async fn insert_file(
        &self,
        user_id: &str,
        metadata: &FileMetadata,
    ) -> Result<FileRecord, AppError> {
        let record = metadata.clone().with_id(new_id());
        self.files
            .entry(user_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn find_file(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .files
            .get(user_id)
            .and_then(|files| files.iter().find(|f| f.id == file_id).cloned()))
    }

    async fn delete_files_named(&self, user_id: &str, name: &str) -> Result<usize, AppError> {
        let Some(mut files) = self.files.get_mut(user_id) else {
            return Ok(0);
        };
        let before = files.len();
        files.retain(|f| f.name != name);
        Ok(before - files.len())
    }
}

#[async_trait]
impl ProfileRepository for MemoryDb {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.get(user_id).map(|p| p.value().clone()))
    }

    async fn put_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), AppError> {
        self.profiles.insert(user_id.to_string(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::file::FileCategory;
    use crate::models::resource::{Location, ResourceType};
    use chrono::Utc;

    fn draft(name: &str) -> ResourceDraft {
        ResourceDraft {
            name: name.to_string(),
            resource_type: ResourceType::Recycling,
            description: "desc".to_string(),
            contact: None,
            location: Location {
                address: "Calle 1".to_string(),
                lat: 0.0,
                lng: 0.0,
            },
        }
    }

    fn metadata(name: &str) -> FileMetadata {
        FileMetadata {
            name: name.to_string(),
            mime_type: "text/plain".to_string(),
            size_bytes: 4,
            uploaded_at: Utc::now(),
            category: FileCategory::Reportes,
            download_url: "memory://x".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resources_keep_insertion_order_per_user() {
        let db = MemoryDb::new();
        let a = db.insert_resource("u1", &draft("a")).await.unwrap();
        let b = db.insert_resource("u1", &draft("b")).await.unwrap();
        db.insert_resource("u2", &draft("c")).await.unwrap();

        assert_ne!(a.id, b.id);
        let names: Vec<String> = db
            .list_resources("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        db.delete_resource("u1", &a.id).await.unwrap();
        db.delete_resource("u1", "missing").await.unwrap();
        assert_eq!(db.resource_count("u1"), 1);
        assert_eq!(db.resource_count("u2"), 1);
    }

    #[tokio::test]
    async fn test_delete_files_named_removes_all_duplicates() {
        let db = MemoryDb::new();
        db.insert_file("u1", &metadata("dup.txt")).await.unwrap();
        db.insert_file("u1", &metadata("dup.txt")).await.unwrap();
        let keep = db.insert_file("u1", &metadata("keep.txt")).await.unwrap();
        db.insert_file("u2", &metadata("dup.txt")).await.unwrap();

        assert_eq!(db.delete_files_named("u1", "dup.txt").await.unwrap(), 2);
        assert_eq!(db.file_count("u1"), 1);
        assert_eq!(db.file_count("u2"), 1);
        assert!(db.find_file("u1", &keep.id).await.unwrap().is_some());
        assert!(db.find_file("u2", &keep.id).await.unwrap().is_none());
    }
}
