// Google credential management module
// Author: kelexine (https://github.com/kelexine)

mod jwt;
mod manager;

pub use jwt::sign_assertion;
pub use manager::TokenManager;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use zeroize::Zeroize;

/// OAuth2 scope granting access to Vertex AI.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Google's OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Application default credentials file, discriminated by its `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUserCredentials),
}

impl Credentials {
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }

    /// Principal used in log lines.
    pub fn principal(&self) -> &str {
        match self {
            Credentials::ServiceAccount(key) => &key.client_email,
            Credentials::AuthorizedUser(user) => &user.client_id,
        }
    }

    pub fn token_uri(&self) -> &str {
        match self {
            Credentials::ServiceAccount(key) => &key.token_uri,
            Credentials::AuthorizedUser(user) => &user.token_uri,
        }
    }
}

/// Service account key as downloaded from the Cloud console.
#[derive(Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// User credentials written by `gcloud auth application-default login`.
#[derive(Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct AuthorizedUserCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

// Custom Debug impls that never log secrets
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl std::fmt::Debug for AuthorizedUserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Successful reply from an OAuth2 token endpoint.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Bearer token cached between requests.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            token: response.access_token,
            expires_at: now + Duration::seconds(response.expires_in),
        }
    }

    /// Check if token is expired or will expire within buffer seconds
    pub fn is_expired(&self, buffer_seconds: i64) -> bool {
        self.expires_at - Utc::now() < Duration::seconds(buffer_seconds)
    }

    /// Get remaining time until expiry in seconds
    pub fn expires_in_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
