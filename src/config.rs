//! Application configuration loaded from environment variables.
//!
//! The Firebase project, API key and bucket are read once at startup.
//! Emulator hosts are picked up by the individual adapters.

use std::env;
use std::str::FromStr;

/// Which set of vendor adapters the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBackend {
    /// Firebase Auth, Cloud Firestore and Firebase Storage.
    Firebase,
    /// Process-local stores. Nothing survives a restart.
    Memory,
}

impl FromStr for DataBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(DataBackend::Firebase),
            "memory" => Ok(DataBackend::Memory),
            _ => Err(ConfigError::Invalid("DATA_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Firebase / GCP project ID
    pub firebase_project_id: String,
    /// Firebase Web API key (used by the Auth REST API)
    pub firebase_api_key: String,
    /// Storage bucket holding user uploads
    pub storage_bucket: String,
    /// Vendor adapters to use
    pub backend: DataBackend,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            firebase_project_id: "test-project".to_string(),
            firebase_api_key: "test-api-key".to_string(),
            storage_bucket: "test-project.firebasestorage.app".to_string(),
            backend: DataBackend::Memory,
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend = match env::var("DATA_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => DataBackend::Firebase,
        };

        let firebase_project_id =
            env::var("FIREBASE_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());

        // The API key is only needed when talking to the real Auth service.
        let firebase_api_key = match backend {
            DataBackend::Firebase => env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            DataBackend::Memory => env::var("FIREBASE_API_KEY").unwrap_or_default(),
        };

        let storage_bucket = env::var("FIREBASE_STORAGE_BUCKET")
            .unwrap_or_else(|_| format!("{}.firebasestorage.app", firebase_project_id));

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            firebase_project_id,
            firebase_api_key,
            storage_bucket,
            backend,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
