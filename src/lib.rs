// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! EcoTrack: personal environmental footprint tracking.
//!
//! This crate provides the backend API for the eco-resource directory,
//! the document locker and the carbon footprint questionnaire.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod time_utils;

use config::{Config, DataBackend};
use db::{FileRepository, FirestoreDb, MemoryDb, ProfileRepository, ResourceRepository};
use services::identity::{FirebaseAuthClient, IdentityProvider, MemoryIdentityProvider};
use services::{CollectionSnapshots, FileCatalog, ResourceCatalog, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use storage::{FirebaseStorage, MemoryObjectStore, ObjectStore};

/// Timeout for calls to the Firebase REST APIs.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Vendor adapters behind the service traits.
#[derive(Clone)]
pub struct Backends {
    pub identity: Arc<dyn IdentityProvider>,
    pub resources: Arc<dyn ResourceRepository>,
    pub files: Arc<dyn FileRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub objects: Arc<dyn ObjectStore>,
}

impl Backends {
    /// Process-local backends for development and tests.
    pub fn memory() -> Self {
        let db = Arc::new(MemoryDb::new());
        Self {
            identity: Arc::new(MemoryIdentityProvider::new()),
            resources: db.clone(),
            files: db.clone(),
            profiles: db,
            objects: Arc::new(MemoryObjectStore::new()),
        }
    }

    /// Firebase Auth, Firestore and Firebase Storage.
    pub async fn firebase(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()?;

        let db = Arc::new(FirestoreDb::new(&config.firebase_project_id).await?);

        Ok(Self {
            identity: Arc::new(FirebaseAuthClient::new(
                http.clone(),
                config.firebase_api_key.clone(),
            )),
            resources: db.clone(),
            files: db.clone(),
            profiles: db,
            objects: Arc::new(FirebaseStorage::new(http, config.storage_bucket.clone())),
        })
    }

    /// Backends selected by `config.backend`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        match config.backend {
            DataBackend::Firebase => Self::firebase(config).await,
            DataBackend::Memory => Ok(Self::memory()),
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionManager,
    pub resources: ResourceCatalog,
    pub files: FileCatalog,
    pub snapshots: Arc<CollectionSnapshots>,
}

impl AppState {
    /// Wire services onto `backends`. Must run inside a tokio runtime,
    /// since snapshot refreshes on sign-in are spawned.
    pub fn new(config: Config, backends: Backends) -> Arc<Self> {
        let sessions = SessionManager::new(backends.identity, backends.profiles);
        let resources = ResourceCatalog::new(backends.resources);
        let files = FileCatalog::new(backends.files, backends.objects);

        let snapshots = Arc::new(CollectionSnapshots::new(resources.clone(), files.clone()));
        snapshots.attach(&sessions);

        Arc::new(Self {
            config,
            sessions,
            resources,
            files,
            snapshots,
        })
    }
}
