// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user snapshots of the resource and file collections.
//!
//! Snapshots are rebuilt on sign-in and after every catalog change. Each
//! fetch takes a ticket from a monotonic sequence; a result is only kept
//! if its ticket is still the newest one issued for that user, so a slow
//! fetch can never overwrite a newer one.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::error::AppError;
use crate::models::file::{count_by_category, FileCategory, FileFilter, FileRecord};
use crate::models::resource::{Resource, ResourceFilter};
use crate::services::files::FileCatalog;
use crate::services::resources::ResourceCatalog;
use crate::services::session::{IdentityEvent, SessionManager, SubscriptionId};

/// Collections fetched for one user at one point in time.
#[derive(Debug, Clone)]
pub struct UserSnapshot {
    pub resources: Vec<Resource>,
    pub files: Vec<FileRecord>,
    pub fetched_at: DateTime<Utc>,
}

/// Dashboard counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub resource_count: usize,
    pub file_count: usize,
    pub files_by_category: BTreeMap<FileCategory, usize>,
    pub fetched_at: DateTime<Utc>,
}

impl From<&UserSnapshot> for DashboardSummary {
    fn from(snapshot: &UserSnapshot) -> Self {
        Self {
            resource_count: snapshot.resources.len(),
            file_count: snapshot.files.len(),
            files_by_category: count_by_category(&snapshot.files),
            fetched_at: snapshot.fetched_at,
        }
    }
}

/// Ticket identifying one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Per-user collection cache.
pub struct CollectionSnapshots {
    resources: ResourceCatalog,
    files: FileCatalog,
    snapshots: DashMap<String, UserSnapshot>,
    /// Newest ticket issued per user
    latest: DashMap<String, Ticket>,
    sequence: AtomicU64,
}

impl CollectionSnapshots {
    pub fn new(resources: ResourceCatalog, files: FileCatalog) -> Self {
        Self {
            resources,
            files,
            snapshots: DashMap::new(),
            latest: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Follow identity changes: refetch on sign-in, drop on sign-out.
    ///
    /// Sign-in refetches run on a spawned task, so this must be called
    /// from within a tokio runtime.
    pub fn attach(self: &Arc<Self>, sessions: &SessionManager) -> SubscriptionId {
        let snapshots = Arc::clone(self);
        sessions.subscribe(move |event| match event {
            IdentityEvent::SignedIn(identity) => {
                let snapshots = Arc::clone(&snapshots);
                let uid = identity.uid.clone();
                // Take the ticket now so event order decides which fetch wins.
                let ticket = snapshots.issue_ticket(&uid);
                tokio::spawn(async move {
                    if let Err(e) = snapshots.fetch_with(&uid, ticket).await {
                        tracing::warn!(uid = %uid, error = %e, "Snapshot fetch after sign-in failed");
                    }
                });
            }
            IdentityEvent::SignedOut { uid } => snapshots.drop_user(uid),
        })
    }

    /// Take a new ticket for `uid`, invalidating all earlier ones.
    pub fn issue_ticket(&self, uid: &str) -> Ticket {
        let ticket = Ticket(self.sequence.fetch_add(1, Ordering::SeqCst) + 1);
        self.latest.insert(uid.to_string(), ticket);
        ticket
    }

    /// Store a snapshot if `ticket` is still the newest for `uid`.
    ///
    /// Returns whether the snapshot was kept.
    pub fn store(&self, uid: &str, ticket: Ticket, snapshot: UserSnapshot) -> bool {
        // Hold the ticket entry while writing so a concurrent issue_ticket
        // cannot interleave between the check and the insert.
        let Some(latest) = self.latest.get(uid) else {
            return false;
        };
        if *latest != ticket {
            tracing::debug!(uid, ?ticket, latest = ?*latest, "Discarding stale snapshot");
            return false;
        }
        self.snapshots.insert(uid.to_string(), snapshot);
        true
    }

    async fn fetch_with(&self, uid: &str, ticket: Ticket) -> Result<Option<UserSnapshot>, AppError> {
        let all_resources = ResourceFilter::default();
        let all_files = FileFilter::default();
        let (resources, files) = tokio::try_join!(
            self.resources.list(uid, &all_resources),
            self.files.list(uid, &all_files),
        )?;

        let snapshot = UserSnapshot {
            resources,
            files,
            fetched_at: Utc::now(),
        };

        Ok(self.store(uid, ticket, snapshot.clone()).then_some(snapshot))
    }

    /// Refetch both collections for `uid`.
    ///
    /// Returns the fresh snapshot, or `None` if a newer fetch superseded it.
    pub async fn refresh(&self, uid: &str) -> Result<Option<UserSnapshot>, AppError> {
        let ticket = self.issue_ticket(uid);
        self.fetch_with(uid, ticket).await
    }

    /// Refetch after a catalog change. Failures are logged, not returned;
    /// the change itself already succeeded.
    pub async fn refresh_after_change(&self, uid: &str) {
        if let Err(e) = self.refresh(uid).await {
            tracing::warn!(uid, error = %e, "Snapshot refresh after change failed");
        }
    }

    pub fn get(&self, uid: &str) -> Option<UserSnapshot> {
        self.snapshots.get(uid).map(|s| s.value().clone())
    }

    /// Dashboard counts, fetching if nothing is cached yet.
    pub async fn summary(&self, uid: &str) -> Result<DashboardSummary, AppError> {
        if let Some(snapshot) = self.get(uid) {
            return Ok(DashboardSummary::from(&snapshot));
        }

        match self.refresh(uid).await? {
            Some(snapshot) => Ok(DashboardSummary::from(&snapshot)),
            // Lost to a concurrent fetch, which has stored a newer one.
            None => self
                .get(uid)
                .map(|s| DashboardSummary::from(&s))
                .ok_or_else(|| AppError::NotFound("Dashboard snapshot".to_string())),
        }
    }

    /// Forget a user. In-flight fetches for them are discarded.
    pub fn drop_user(&self, uid: &str) {
        self.latest.remove(uid);
        self.snapshots.remove(uid);
        tracing::debug!(uid, "Dropped snapshot");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::storage::MemoryObjectStore;

    fn snapshots() -> CollectionSnapshots {
        let db = Arc::new(MemoryDb::new());
        CollectionSnapshots::new(
            ResourceCatalog::new(db.clone()),
            FileCatalog::new(db, Arc::new(MemoryObjectStore::new())),
        )
    }

    fn empty_snapshot(resources: usize) -> UserSnapshot {
        UserSnapshot {
            resources: (0..resources)
                .map(|i| Resource {
                    id: i.to_string(),
                    name: format!("r{}", i),
                    resource_type: crate::models::ResourceType::Event,
                    description: String::new(),
                    contact: None,
                    location: crate::models::resource::Location {
                        address: String::new(),
                        lat: 0.0,
                        lng: 0.0,
                    },
                })
                .collect(),
            files: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let cache = snapshots();

        let older = cache.issue_ticket("u1");
        let newer = cache.issue_ticket("u1");

        // The newer fetch completes first.
        assert!(cache.store("u1", newer, empty_snapshot(2)));
        // The older one arrives late and must not win.
        assert!(!cache.store("u1", older, empty_snapshot(5)));

        assert_eq!(cache.get("u1").unwrap().resources.len(), 2);
    }

    #[test]
    fn test_tickets_are_per_user() {
        let cache = snapshots();
        let a = cache.issue_ticket("a");
        let _b = cache.issue_ticket("b");
        assert!(cache.store("a", a, empty_snapshot(1)));
    }

    #[test]
    fn test_drop_user_invalidates_in_flight_fetch() {
        let cache = snapshots();
        let ticket = cache.issue_ticket("u1");
        cache.drop_user("u1");

        assert!(!cache.store("u1", ticket, empty_snapshot(1)));
        assert!(cache.get("u1").is_none());
    }

    #[tokio::test]
    async fn test_summary_fetches_when_empty() {
        let cache = snapshots();
        let summary = cache.summary("u1").await.unwrap();
        assert_eq!(summary.resource_count, 0);
        assert_eq!(summary.files_by_category.len(), FileCategory::ALL.len());
    }
}
