// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider: email + password accounts.
//!
//! Handles:
//! - Sign-in and sign-up against Firebase Auth (identitytoolkit v1)
//! - Display name updates and account lookup
//! - ID token refresh via securetoken
//!
//! [`MemoryIdentityProvider`] keeps accounts in process memory for tests
//! and local development.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Identity;

/// Provider credential used for object store calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderTokens {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub identity: Identity,
    pub tokens: ProviderTokens,
}

/// Email + password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AppError>;

    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, AppError>;

    async fn update_display_name(&self, id_token: &str, display_name: &str)
        -> Result<(), AppError>;

    /// Current identity for an ID token.
    async fn lookup(&self, id_token: &str) -> Result<Identity, AppError>;

    /// Exchange a refresh token for a new ID token.
    async fn refresh(&self, refresh_token: &str) -> Result<ProviderTokens, AppError>;

    /// End the provider-side session. Stateless providers do nothing.
    async fn sign_out(&self, _uid: &str) -> Result<(), AppError> {
        Ok(())
    }
}

// ─── Firebase Auth ───────────────────────────────────────────────────

/// Firebase Auth REST client.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    identity_url: String,
    token_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordAuthResponse {
    id_token: String,
    refresh_token: String,
    /// Seconds, as a string
    expires_in: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    /// Milliseconds since the epoch, as a string
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SecureTokenResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn expiry_from(expires_in: &str) -> DateTime<Utc> {
    let secs: i64 = expires_in.parse().unwrap_or(3600);
    Utc::now() + Duration::seconds(secs)
}

/// Map a Firebase Auth error code to an application error.
///
/// Codes sometimes carry a detail suffix, e.g. `WEAK_PASSWORD : Password
/// should be at least 6 characters`.
fn map_auth_error(message: &str) -> AppError {
    let code = message.split(" : ").next().unwrap_or(message).trim();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AppError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AppError::Conflict("Email already registered".to_string()),
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            AppError::InvalidToken
        }
        "WEAK_PASSWORD" => AppError::field("password", "Password must be at least 6 characters"),
        "INVALID_EMAIL" | "MISSING_EMAIL" => {
            AppError::field("email", "Enter a valid email address")
        }
        _ => AppError::Identity(message.to_string()),
    }
}

impl FirebaseAuthClient {
    /// Create a client for the project's Web API key.
    ///
    /// For local development with emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        let (identity_url, token_url) = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                (
                    format!("http://{}/identitytoolkit.googleapis.com/v1", host),
                    format!("http://{}/securetoken.googleapis.com/v1/token", host),
                )
            }
            Err(_) => (
                "https://identitytoolkit.googleapis.com/v1".to_string(),
                "https://securetoken.googleapis.com/v1/token".to_string(),
            ),
        };

        Self {
            http,
            identity_url,
            token_url,
            api_key,
        }
    }

    /// POST a JSON body to an `accounts:*` endpoint.
    async fn accounts_call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, AppError> {
        let url = format!("{}/accounts:{}", self.identity_url, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => map_auth_error(&envelope.error.message),
                Err(_) => AppError::Identity(format!("HTTP {}: {}", status, body)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("JSON parse error: {}", e)))
    }

    async fn password_auth(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, AppError> {
        let auth: PasswordAuthResponse = self
            .accounts_call(
                method,
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let tokens = ProviderTokens {
            expires_at: expiry_from(&auth.expires_in),
            id_token: auth.id_token,
            refresh_token: auth.refresh_token,
        };
        let identity = self.lookup(&tokens.id_token).await?;

        Ok(ProviderSession { identity, tokens })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        self.password_auth("signInWithPassword", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        let session = self.password_auth("signUp", email, password).await?;
        tracing::info!(uid = %session.identity.uid, "Account created");
        Ok(session)
    }

    async fn update_display_name(
        &self,
        id_token: &str,
        display_name: &str,
    ) -> Result<(), AppError> {
        let _: serde_json::Value = self
            .accounts_call(
                "update",
                serde_json::json!({
                    "idToken": id_token,
                    "displayName": display_name,
                    "returnSecureToken": false,
                }),
            )
            .await?;
        Ok(())
    }

    async fn lookup(&self, id_token: &str) -> Result<Identity, AppError> {
        let response: LookupResponse = self
            .accounts_call("lookup", serde_json::json!({ "idToken": id_token }))
            .await?;

        let account = response.users.into_iter().next().ok_or(AppError::InvalidToken)?;

        let created_at = account
            .created_at
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);

        Ok(Identity {
            uid: account.local_id,
            email: account.email,
            display_name: account.display_name.filter(|n| !n.is_empty()),
            created_at,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderTokens, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Token refresh request failed: {}", e)))?;

        let refreshed: SecureTokenResponse = self.check_response_json(response).await?;

        Ok(ProviderTokens {
            expires_at: expiry_from(&refreshed.expires_in),
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
        })
    }
}

// ─── In-memory provider ──────────────────────────────────────────────

#[derive(Clone)]
struct MemoryAccount {
    identity: Identity,
    password: String,
}

/// Accounts held in process memory.
///
/// Tokens are random strings valid for one hour.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    /// Accounts by uid
    accounts: DashMap<String, MemoryAccount>,
    /// uid by lowercased email
    emails: DashMap<String, String>,
    /// uid by ID token
    id_tokens: DashMap<String, String>,
    /// uid by refresh token
    refresh_tokens: DashMap<String, String>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_tokens(&self, uid: &str) -> ProviderTokens {
        let id_token = format!("mem-id-{}", Uuid::new_v4().simple());
        let refresh_token = format!("mem-refresh-{}", Uuid::new_v4().simple());
        self.id_tokens.insert(id_token.clone(), uid.to_string());
        self.refresh_tokens
            .insert(refresh_token.clone(), uid.to_string());

        ProviderTokens {
            id_token,
            refresh_token,
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    fn uid_for_id_token(&self, id_token: &str) -> Result<String, AppError> {
        self.id_tokens
            .get(id_token)
            .map(|uid| uid.value().clone())
            .ok_or(AppError::InvalidToken)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        let uid = self
            .emails
            .get(&email.trim().to_lowercase())
            .map(|uid| uid.value().clone())
            .ok_or(AppError::InvalidCredentials)?;

        let account = self
            .accounts
            .get(&uid)
            .map(|a| a.value().clone())
            .ok_or(AppError::InvalidCredentials)?;

        if account.password != password {
            return Err(AppError::InvalidCredentials);
        }

        Ok(ProviderSession {
            identity: account.identity,
            tokens: self.issue_tokens(&uid),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        if password.len() < 6 {
            return Err(map_auth_error("WEAK_PASSWORD"));
        }

        let key = email.trim().to_lowercase();
        let uid = Uuid::new_v4().simple().to_string();

        // Entry API keeps check-and-insert atomic for concurrent sign-ups.
        match self.emails.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(map_auth_error("EMAIL_EXISTS"));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(uid.clone());
            }
        }

        let identity = Identity {
            uid: uid.clone(),
            email: email.trim().to_string(),
            display_name: None,
            created_at: Utc::now(),
        };
        self.accounts.insert(
            uid.clone(),
            MemoryAccount {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );

        Ok(ProviderSession {
            identity,
            tokens: self.issue_tokens(&uid),
        })
    }

    async fn update_display_name(
        &self,
        id_token: &str,
        display_name: &str,
    ) -> Result<(), AppError> {
        let uid = self.uid_for_id_token(id_token)?;
        let mut account = self.accounts.get_mut(&uid).ok_or(AppError::InvalidToken)?;
        account.identity.display_name = Some(display_name.to_string());
        Ok(())
    }

    async fn lookup(&self, id_token: &str) -> Result<Identity, AppError> {
        let uid = self.uid_for_id_token(id_token)?;
        self.accounts
            .get(&uid)
            .map(|a| a.identity.clone())
            .ok_or(AppError::InvalidToken)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderTokens, AppError> {
        let (_, uid) = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(AppError::InvalidToken)?;
        Ok(self.issue_tokens(&uid))
    }

    async fn sign_out(&self, uid: &str) -> Result<(), AppError> {
        self.id_tokens.retain(|_, owner| owner.as_str() != uid);
        self.refresh_tokens.retain(|_, owner| owner.as_str() != uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_auth_error() {
        assert!(matches!(
            map_auth_error("INVALID_LOGIN_CREDENTIALS"),
            AppError::InvalidCredentials
        ));
        assert!(matches!(map_auth_error("EMAIL_EXISTS"), AppError::Conflict(_)));
        let weak = map_auth_error("WEAK_PASSWORD : Password should be at least 6 characters");
        assert!(weak.field_errors().unwrap().contains_key("password"));
        assert!(matches!(
            map_auth_error("QUOTA_EXCEEDED"),
            AppError::Identity(_)
        ));
    }

    #[tokio::test]
    async fn test_memory_provider_accounts() {
        let provider = MemoryIdentityProvider::new();
        let session = provider.sign_up("Ana@Example.com", "secret1").await.unwrap();

        assert!(matches!(
            provider.sign_up("ana@example.com", "secret2").await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            provider.sign_in("ana@example.com", "wrong!").await,
            Err(AppError::InvalidCredentials)
        ));

        provider
            .update_display_name(&session.tokens.id_token, "Ana Gómez")
            .await
            .unwrap();
        let signed_in = provider.sign_in("ana@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in.identity.uid, session.identity.uid);
        assert_eq!(signed_in.identity.display_name.as_deref(), Some("Ana Gómez"));
    }

    #[tokio::test]
    async fn test_memory_refresh_rotates_tokens() {
        let provider = MemoryIdentityProvider::new();
        let session = provider.sign_up("a@b.co", "secret1").await.unwrap();

        let refreshed = provider.refresh(&session.tokens.refresh_token).await.unwrap();
        assert_ne!(refreshed.id_token, session.tokens.id_token);
        assert!(provider.refresh(&session.tokens.refresh_token).await.is_err());

        provider.sign_out(&session.identity.uid).await.unwrap();
        assert!(provider.lookup(&refreshed.id_token).await.is_err());
    }
}
