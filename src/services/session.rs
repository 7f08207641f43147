// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session manager: signed-in identities and identity-change events.
//!
//! Sessions live for the lifetime of the process. Each one caches the
//! provider identity and tokens for a uid; the ID token is refreshed
//! shortly before it expires, serialized per user.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use validator::Validate;

use crate::db::ProfileRepository;
use crate::error::AppError;
use crate::models::{Identity, ProfileUpdate, Registration, UserProfile};
use crate::services::identity::{IdentityProvider, ProviderSession, ProviderTokens};

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Identity change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityEvent {
    SignedIn(Identity),
    SignedOut { uid: String },
}

impl IdentityEvent {
    pub fn uid(&self) -> &str {
        match self {
            IdentityEvent::SignedIn(identity) => &identity.uid,
            IdentityEvent::SignedOut { uid } => uid,
        }
    }
}

/// Handle returned by [`SessionManager::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&IdentityEvent) + Send + Sync>;

#[derive(Clone)]
struct CachedSession {
    identity: Identity,
    tokens: ProviderTokens,
}

/// Tracks signed-in users and notifies subscribers of identity changes.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepository>,
    sessions: DashMap<String, CachedSession>,
    /// Per-user mutex to serialize token refresh operations.
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
    listeners: DashMap<SubscriptionId, Listener>,
    next_subscription: AtomicU64,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self {
            provider,
            profiles,
            sessions: DashMap::new(),
            refresh_locks: DashMap::new(),
            listeners: DashMap::new(),
            next_subscription: AtomicU64::new(1),
        }
    }

    // ─── Subscriptions ───────────────────────────────────────────────────────

    /// Register a listener for identity changes.
    ///
    /// Listeners run synchronously on the task that caused the change and
    /// must not block.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&IdentityEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, Arc::new(listener));
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    fn emit(&self, event: IdentityEvent) {
        // Snapshot first so a listener may (un)subscribe without deadlocking.
        let listeners: Vec<Listener> = self.listeners.iter().map(|l| l.value().clone()).collect();
        tracing::debug!(uid = event.uid(), listeners = listeners.len(), "Identity event");
        for listener in listeners {
            listener(&event);
        }
    }

    fn start_session(&self, session: ProviderSession) -> Identity {
        let identity = session.identity.clone();
        self.sessions.insert(
            identity.uid.clone(),
            CachedSession {
                identity: session.identity,
                tokens: session.tokens,
            },
        );
        self.emit(IdentityEvent::SignedIn(identity.clone()));
        identity
    }

    // ─── Sign-in / Sign-out ──────────────────────────────────────────────────

    /// Create an account, set its display name and write the profile.
    pub async fn register(&self, form: Registration) -> Result<Identity, AppError> {
        form.validate()?;

        let mut session = self
            .provider
            .sign_up(form.email.trim(), &form.password)
            .await?;
        let uid = session.identity.uid.clone();

        let display_name = form.full_name();
        self.provider
            .update_display_name(&session.tokens.id_token, &display_name)
            .await?;
        session.identity.display_name = Some(display_name);

        self.profiles.put_profile(&uid, &form.profile()).await?;

        tracing::info!(uid = %uid, "User registered");
        Ok(self.start_session(session))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let mut errors = crate::error::FieldErrors::new();
        if email.trim().is_empty() {
            errors.insert("email".to_string(), "Email is required".to_string());
        }
        if password.is_empty() {
            errors.insert("password".to_string(), "Password is required".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let session = self.provider.sign_in(email.trim(), password).await?;
        tracing::info!(uid = %session.identity.uid, "User signed in");
        Ok(self.start_session(session))
    }

    /// Sign out. Unknown uids are a no-op.
    pub async fn logout(&self, uid: &str) -> Result<(), AppError> {
        if self.sessions.remove(uid).is_none() {
            return Ok(());
        }
        self.refresh_locks.remove(uid);

        self.provider.sign_out(uid).await?;
        tracing::info!(uid, "User signed out");
        self.emit(IdentityEvent::SignedOut {
            uid: uid.to_string(),
        });
        Ok(())
    }

    /// Cached identity of a signed-in user.
    pub fn current(&self, uid: &str) -> Option<Identity> {
        self.sessions.get(uid).map(|s| s.identity.clone())
    }

    pub fn signed_in_count(&self) -> usize {
        self.sessions.len()
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid provider ID token for the given user, refreshing it when
    /// it expires within the next five minutes.
    pub async fn id_token(&self, uid: &str) -> Result<String, AppError> {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        if let Some(cached) = self.sessions.get(uid) {
            if Utc::now() + margin < cached.tokens.expires_at {
                return Ok(cached.tokens.id_token.clone());
            }
        } else {
            return Err(AppError::Unauthorized);
        }

        let lock = self
            .refresh_locks
            .entry(uid.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        // Another task may have refreshed while we were waiting.
        let refresh_token = match self.sessions.get(uid) {
            Some(cached) if Utc::now() + margin < cached.tokens.expires_at => {
                return Ok(cached.tokens.id_token.clone());
            }
            Some(cached) => cached.tokens.refresh_token.clone(),
            None => return Err(AppError::Unauthorized),
        };

        tracing::info!(uid, "Provider token expiring, refreshing");
        let tokens = self.provider.refresh(&refresh_token).await?;
        let id_token = tokens.id_token.clone();

        match self.sessions.get_mut(uid) {
            Some(mut cached) => cached.tokens = tokens,
            // Signed out while refreshing.
            None => return Err(AppError::Unauthorized),
        }

        Ok(id_token)
    }

    // ─── Profile ─────────────────────────────────────────────────────────────

    /// Stored profile, or one seeded from the identity if none was written.
    pub async fn profile(&self, uid: &str) -> Result<UserProfile, AppError> {
        let identity = self.current(uid).ok_or(AppError::Unauthorized)?;

        Ok(self
            .profiles
            .get_profile(uid)
            .await?
            .unwrap_or_else(|| UserProfile {
                email: identity.email,
                ..Default::default()
            }))
    }

    /// Merge a partial update into the stored profile.
    pub async fn update_profile(
        &self,
        uid: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AppError> {
        let mut profile = self.profile(uid).await?;
        profile.merge(update);

        if profile.email.trim().is_empty() {
            return Err(AppError::field("email", "Email is required"));
        }

        self.profiles.put_profile(uid, &profile).await?;
        tracing::info!(uid, "Profile updated");
        Ok(profile)
    }

    #[cfg(test)]
    fn expire_token(&self, uid: &str) {
        if let Some(mut cached) = self.sessions.get_mut(uid) {
            cached.tokens.expires_at = Utc::now();
        }
    }
}
