// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Storage REST client.
//!
//! Requests carry the user's ID token as `Authorization: Firebase <token>`,
//! so bucket security rules apply exactly as they would for the web SDK.

use async_trait::async_trait;
use serde::Deserialize;

use super::{ObjectStore, StorageError};

/// Firebase Storage client for one bucket.
#[derive(Clone)]
pub struct FirebaseStorage {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

/// Subset of the object metadata resource we read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    /// Comma-separated download tokens
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    /// Create a client for `bucket`.
    ///
    /// For local development with emulator, set FIREBASE_STORAGE_EMULATOR_HOST.
    pub fn new(http: reqwest::Client, bucket: String) -> Self {
        let base_url = match std::env::var("FIREBASE_STORAGE_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Storage emulator");
                format!("http://{}/v0", host)
            }
            Err(_) => "https://firebasestorage.googleapis.com/v0".to_string(),
        };

        Self {
            http,
            base_url,
            bucket,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(path)
        )
    }

    /// Map an unsuccessful response to a storage error.
    async fn check_response(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StorageError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Remote(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait]
impl ObjectStore for FirebaseStorage {
    async fn put(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
        auth_token: &str,
    ) -> Result<(), StorageError> {
        let url = format!("{}/b/{}/o", self.base_url, self.bucket);

        let response = self
            .http
            .post(&url)
            .query(&[("name", path)])
            .header("Authorization", format!("Firebase {}", auth_token))
            .header("Content-Type", content_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        self.check_response(path, response).await?;
        tracing::debug!(path, bytes = data.len(), "Uploaded object");
        Ok(())
    }

    async fn download_url(&self, path: &str, auth_token: &str) -> Result<String, StorageError> {
        let url = self.object_url(path);

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Firebase {}", auth_token))
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        let metadata: ObjectMetadata = self
            .check_response(path, response)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::Remote(format!("JSON parse error: {}", e)))?;

        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|t| !t.is_empty());

        Ok(match token {
            Some(token) => format!("{}?alt=media&token={}", url, token),
            None => format!("{}?alt=media", url),
        })
    }

    async fn delete(&self, path: &str, auth_token: &str) -> Result<(), StorageError> {
        let response = self
            .http
            .delete(self.object_url(path))
            .header("Authorization", format!("Firebase {}", auth_token))
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        self.check_response(path, response).await?;
        tracing::debug!(path, "Deleted object");
        Ok(())
    }
}
