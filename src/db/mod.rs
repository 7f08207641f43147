// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store layer.
//!
//! Catalogs talk to the store through the repository traits below so the
//! Firestore adapter can be swapped for the in-memory one.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::file::{FileMetadata, FileRecord};
use crate::models::resource::{Resource, ResourceDraft};
use crate::models::UserProfile;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

/// Collection names as constants.
pub mod collections {
    /// Profiles, keyed by uid. Also the parent of each user's resources.
    pub const USERS: &str = "users";
    /// Resources, nested under `users/{uid}`
    pub const RESOURCES: &str = "lugares";
    /// File metadata, top level, filtered by `userId`
    pub const FILES: &str = "files";
}

/// Eco-resources, partitioned per user.
#[async_trait]
pub trait ResourceRepository: Send + Sync + 'static {
    /// All resources in the user's partition, in store order.
    async fn list_resources(&self, user_id: &str) -> Result<Vec<Resource>>;

    /// Insert one resource. The store assigns the id.
    async fn insert_resource(&self, user_id: &str, draft: &ResourceDraft) -> Result<Resource>;

    /// Delete by id. Unknown ids are not an error.
    async fn delete_resource(&self, user_id: &str, resource_id: &str) -> Result<()>;
}

/// File metadata documents.
#[async_trait]
pub trait FileRepository: Send + Sync + 'static {
    async fn list_files(&self, user_id: &str) -> Result<Vec<FileRecord>>;

    async fn insert_file(&self, user_id: &str, metadata: &FileMetadata) -> Result<FileRecord>;

    /// Look up one of the user's files by id.
    async fn find_file(&self, user_id: &str, file_id: &str) -> Result<Option<FileRecord>>;

    /// Delete every document of this user with the given name.
    ///
    /// Returns the number of documents removed.
    async fn delete_files_named(&self, user_id: &str, name: &str) -> Result<usize>;
}

/// Profile documents at `users/{uid}`.
#[async_trait]
pub trait ProfileRepository: Send + Sync + 'static {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Create or replace the profile.
    async fn put_profile(&self, user_id: &str, profile: &UserProfile) -> Result<()>;
}
