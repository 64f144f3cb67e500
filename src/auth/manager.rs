//! Google access token management.
//!
//! This module provides the `TokenManager`, which loads application default
//! credentials once at startup and hands out bearer tokens for Vertex AI.
//! Tokens are cached in memory and refreshed shortly before they expire,
//! using a double-checked lock so concurrent uploads trigger one refresh.

// Author: kelexine (https://github.com/kelexine)

use super::{
    sign_assertion, AccessToken, Credentials, TokenResponse, CLOUD_PLATFORM_SCOPE,
};
use crate::config::AuthConfig;
use crate::error::{GatewayError, Result};
use crate::utils::logging::sanitize;
use chrono::Utc;
use reqwest::Client;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Provides valid access tokens for the configured Google principal.
///
/// The `TokenManager` uses an `Arc<RwLock>` to allow high-concurrency access to the
/// current token, with a `Mutex` to serialize refresh attempts.
#[derive(Clone)]
pub struct TokenManager {
    credentials: Arc<Credentials>,
    /// Current token, `None` until the first request.
    cached: Arc<RwLock<Option<AccessToken>>>,
    /// Lock used to prevent "thundering herd" refresh attempts when a token expires.
    refresh_lock: Arc<Mutex<()>>,
    http_client: Client,
    refresh_buffer_seconds: i64,
}

impl TokenManager {
    /// Loads credentials from `auth.credentials_path`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` when no path is configured and
    /// `GatewayError::Credentials` if the file is missing or malformed.
    pub fn load(config: &AuthConfig) -> Result<Self> {
        let path = config.credentials_path.as_deref().ok_or_else(|| {
            GatewayError::Config("GOOGLE_APPLICATION_CREDENTIALS is not set".to_string())
        })?;

        let credentials = Self::load_credentials(Path::new(path))?;
        info!(
            "Loaded Google credentials for {} from {}",
            credentials.principal(),
            path
        );

        Self::new(credentials, config)
    }

    /// Builds a manager around already-parsed credentials.
    pub fn new(credentials: Credentials, config: &AuthConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .use_rustls_tls()
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            credentials: Arc::new(credentials),
            cached: Arc::new(RwLock::new(None)),
            refresh_lock: Arc::new(Mutex::new(())),
            http_client,
            refresh_buffer_seconds: config.refresh_buffer_seconds,
        })
    }

    /// Reads credentials from the filesystem and performs basic validation.
    fn load_credentials(path: &Path) -> Result<Credentials> {
        if !path.exists() {
            return Err(GatewayError::Credentials(format!(
                "Credentials file not found: {}",
                path.display()
            )));
        }

        Self::check_permissions(path);

        let contents = fs::read_to_string(path).map_err(|e| {
            GatewayError::Credentials(format!("Failed to read credentials: {}", e))
        })?;

        Credentials::from_json(&contents).map_err(|e| {
            GatewayError::Credentials(format!("Invalid credentials JSON format: {}", e))
        })
    }

    /// Warns when the key file is readable by group or others.
    fn check_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            if let Ok(metadata) = fs::metadata(path) {
                let mode = metadata.permissions().mode() & 0o777;
                if mode & 0o077 != 0 {
                    warn!(
                        "Credentials file {} is accessible by other users ({:o}); 0600 is recommended",
                        path.display(),
                        mode
                    );
                }
            }
        }
        #[cfg(not(unix))]
        let _ = path;
    }

    /// Acquires a valid access token, performing a refresh if necessary.
    ///
    /// 1. Optimized check with a shared `RwLock` read-lock.
    /// 2. If missing or expired, acquires the `Mutex` to synchronize refresh logic.
    /// 3. Re-checks inside the mutex in case another task already refreshed.
    pub async fn get_token(&self) -> Result<String> {
        // Fast path: Token is still valid.
        if let Some(token) = self.current_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        if let Some(token) = self.current_token().await {
            debug!("Token already refreshed by another concurrent request.");
            return Ok(token);
        }

        let token = self.fetch_token().await?;
        debug!("Access token valid for {} seconds", token.expires_in_seconds());

        let value = token.token.clone();
        *self.cached.write().await = Some(token);
        Ok(value)
    }

    async fn current_token(&self) -> Option<String> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|t| !t.is_expired(self.refresh_buffer_seconds))
            .map(|t| t.token.clone())
    }

    /// Negotiates a new access token with the credential's token endpoint.
    async fn fetch_token(&self) -> Result<AccessToken> {
        let now = Utc::now();
        let token_uri = self.credentials.token_uri();

        let request = match self.credentials.as_ref() {
            Credentials::ServiceAccount(key) => {
                let assertion = sign_assertion(key, CLOUD_PLATFORM_SCOPE, now)?;
                self.http_client
                    .post(token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            }
            Credentials::AuthorizedUser(user) => self.http_client.post(token_uri).form(&[
                ("grant_type", "refresh_token"),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", user.refresh_token.as_str()),
            ]),
        };

        debug!("Requesting access token from {}", token_uri);

        let response = request.send().await.map_err(|e| {
            GatewayError::TokenExchange(format!("Token endpoint unreachable: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let body = sanitize(&body);
            error!("Token exchange failed: HTTP {} - {}", status, body);
            return Err(GatewayError::TokenExchange(format!("HTTP {}: {}", status, body)));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            GatewayError::TokenExchange(format!("Invalid token response: {}", e))
        })?;

        info!("Obtained access token for {}", self.credentials.principal());
        Ok(AccessToken::from_response(parsed, now))
    }
}
