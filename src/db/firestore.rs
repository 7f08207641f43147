// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the repository operations for:
//! - Profiles (`users/{uid}`)
//! - Resources (`users/{uid}/lugares`)
//! - File metadata (top-level `files`, filtered by `userId`)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::db::{collections, FileRepository, ProfileRepository, ResourceRepository};
use crate::error::AppError;
use crate::models::file::{FileCategory, FileMetadata, FileRecord};
use crate::models::resource::{Location, Resource, ResourceDraft, ResourceType};
use crate::models::UserProfile;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Resource document. The id comes from the document name.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResourceDoc {
    #[serde(rename = "_firestore_id", default, skip_serializing)]
    doc_id: Option<String>,
    name: String,
    #[serde(rename = "type")]
    resource_type: ResourceType,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contact: Option<String>,
    location: Location,
}

impl From<&ResourceDraft> for ResourceDoc {
    fn from(draft: &ResourceDraft) -> Self {
        Self {
            doc_id: None,
            name: draft.name.clone(),
            resource_type: draft.resource_type,
            description: draft.description.clone(),
            contact: draft.contact.clone(),
            location: draft.location.clone(),
        }
    }
}

impl ResourceDoc {
    fn into_resource(self) -> Result<Resource, AppError> {
        let id = self
            .doc_id
            .ok_or_else(|| AppError::Database("Resource document without id".to_string()))?;
        Ok(Resource {
            id,
            name: self.name,
            resource_type: self.resource_type,
            description: self.description,
            contact: self.contact,
            location: self.location,
        })
    }
}

/// File metadata document, camelCase as the web client wrote it.
///
/// Older documents also carry a client-side `id` data field. It is not
/// the document id and is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDoc {
    #[serde(rename = "_firestore_id", default, skip_serializing)]
    doc_id: Option<String>,
    user_id: String,
    name: String,
    #[serde(rename = "type")]
    mime_type: String,
    size: u64,
    #[serde(with = "firestore::serialize_as_timestamp")]
    upload_date: DateTime<Utc>,
    category: FileCategory,
    url: String,
}

impl FileDoc {
    fn new(user_id: &str, metadata: &FileMetadata) -> Self {
        Self {
            doc_id: None,
            user_id: user_id.to_string(),
            name: metadata.name.clone(),
            mime_type: metadata.mime_type.clone(),
            size: metadata.size_bytes,
            upload_date: metadata.uploaded_at,
            category: metadata.category,
            url: metadata.download_url.clone(),
        }
    }

    fn into_record(self) -> Result<FileRecord, AppError> {
        let id = self
            .doc_id
            .ok_or_else(|| AppError::Database("File document without id".to_string()))?;
        Ok(FileRecord {
            id,
            name: self.name,
            mime_type: self.mime_type,
            size_bytes: self.size,
            uploaded_at: self.upload_date,
            category: self.category,
            download_url: self.url,
        })
    }
}

/// Profile document at `users/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDoc {
    #[serde(default)]
    name: String,
    #[serde(default)]
    surname: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    birth_date: String,
    #[serde(default)]
    dni: String,
}

impl From<&UserProfile> for ProfileDoc {
    fn from(p: &UserProfile) -> Self {
        Self {
            name: p.name.clone(),
            surname: p.surname.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            birth_date: p.birth_date.clone(),
            dni: p.dni.clone(),
        }
    }
}

impl From<ProfileDoc> for UserProfile {
    fn from(d: ProfileDoc) -> Self {
        Self {
            name: d.name,
            surname: d.surname,
            email: d.email,
            phone: d.phone,
            birth_date: d.birth_date,
            dni: d.dni,
        }
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Parent path of a user's nested collections.
    fn user_path(&self, user_id: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        self.client
            .parent_path(collections::USERS, user_id)
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

// ─── Resource Operations ─────────────────────────────────────────

#[async_trait]
impl ResourceRepository for FirestoreDb {
    async fn list_resources(&self, user_id: &str) -> Result<Vec<Resource>, AppError> {
        let parent = self.user_path(user_id)?;

        let docs: Vec<ResourceDoc> = self
            .client
            .fluent()
            .select()
            .from(collections::RESOURCES)
            .parent(&parent)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        docs.into_iter().map(ResourceDoc::into_resource).collect()
    }

    async fn insert_resource(
        &self,
        user_id: &str,
        draft: &ResourceDraft,
    ) -> Result<Resource, AppError> {
        let parent = self.user_path(user_id)?;
        let doc = ResourceDoc::from(draft);

        let stored: ResourceDoc = self
            .client
            .fluent()
            .insert()
            .into(collections::RESOURCES)
            .generate_document_id()
            .parent(&parent)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let resource = stored.into_resource()?;
        tracing::debug!(user_id, resource_id = %resource.id, "Resource stored");
        Ok(resource)
    }

    async fn delete_resource(&self, user_id: &str, resource_id: &str) -> Result<(), AppError> {
        let parent = self.user_path(user_id)?;

        // Firestore deletes of missing documents succeed.
        self.client
            .fluent()
            .delete()
            .from(collections::RESOURCES)
            .document_id(resource_id)
            .parent(&parent)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── File Metadata Operations ────────────────────────────────────

#[async_trait]
impl FileRepository for FirestoreDb {
    async fn list_files(&self, user_id: &str) -> Result<Vec<FileRecord>, AppError> {
        let docs: Vec<FileDoc> = self
            .client
            .fluent()
            .select()
            .from(collections::FILES)
            .filter(|q| q.for_all([q.field("userId").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        docs.into_iter().map(FileDoc::into_record).collect()
    }

    async fn insert_file(
        &self,
        user_id: &str,
        metadata: &FileMetadata,
    ) -> Result<FileRecord, AppError> {
        let doc = FileDoc::new(user_id, metadata);

        let stored: FileDoc = self
            .client
            .fluent()
            .insert()
            .into(collections::FILES)
            .generate_document_id()
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        stored.into_record()
    }

    async fn find_file(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let doc: Option<FileDoc> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::FILES)
            .obj()
            .one(file_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Other users' documents are invisible.
        doc.filter(|d| d.user_id == user_id)
            .map(FileDoc::into_record)
            .transpose()
    }

    async fn delete_files_named(&self, user_id: &str, name: &str) -> Result<usize, AppError> {
        let docs: Vec<FileDoc> = self
            .client
            .fluent()
            .select()
            .from(collections::FILES)
            .filter(|q| {
                q.for_all([
                    q.field("userId").eq(user_id),
                    q.field("name").eq(name),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ids: Vec<String> = docs.into_iter().filter_map(|d| d.doc_id).collect();
        let count = ids.len();
        let client = &self.client;

        stream::iter(ids)
            .map(|id| async move {
                client
                    .fluent()
                    .delete()
                    .from(collections::FILES)
                    .document_id(&id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::debug!(user_id, name, count, "Deleted file metadata documents");
        Ok(count)
    }
}

// ─── Profile Operations ──────────────────────────────────────────

#[async_trait]
impl ProfileRepository for FirestoreDb {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        let doc: Option<ProfileDoc> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(UserProfile::from))
    }

    async fn put_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(&ProfileDoc::from(profile))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_doc_ignores_client_side_id() {
        let doc: FileDoc = serde_json::from_value(json!({
            "_firestore_id": "abc",
            "id": "1712345678901-0.5",
            "userId": "u1",
            "name": "factura.pdf",
            "type": "application/pdf",
            "size": 2048,
            "uploadDate": "2024-04-05T10:00:00Z",
            "category": "facturas",
            "url": "https://example.invalid/factura.pdf"
        }))
        .unwrap();

        let record = doc.into_record().unwrap();
        assert_eq!(record.id, "abc");
        assert_eq!(record.category, FileCategory::Facturas);
        assert_eq!(record.size_bytes, 2048);
    }

    #[test]
    fn test_new_file_doc_does_not_write_an_id() {
        let metadata = FileMetadata {
            name: "guia.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 1,
            uploaded_at: Utc::now(),
            category: FileCategory::Guias,
            download_url: "https://example.invalid/guia.pdf".to_string(),
        };
        let value = serde_json::to_value(FileDoc::new("u1", &metadata)).unwrap();
        assert!(value.get("_firestore_id").is_none());
        assert!(value.get("id").is_none());
        assert_eq!(value["userId"], "u1");
    }

    #[test]
    fn test_resource_doc_without_id_is_an_error() {
        let doc: ResourceDoc = serde_json::from_value(json!({
            "name": "Punto Limpio",
            "type": "recycling",
            "description": "Vidrio",
            "location": { "address": "Calle 1", "lat": 0.0, "lng": 0.0 }
        }))
        .unwrap();
        assert!(doc.into_resource().is_err());
    }
}
