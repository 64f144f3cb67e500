//! Configuration data structures for the imgdesc gateway.
//!
//! This module defines the schema for the application settings, including
//! server parameters, Vertex AI specifics, Google credentials and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};
use std::fmt;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, static assets, upload bound).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Vertex AI settings.
    #[serde(default)]
    pub vertex: VertexConfig,

    /// Google credential settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Production or stub wiring.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `0.0.0.0`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `3000` (overridden by `PORT`)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the bundled front-end.
    /// Default: `public`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Largest accepted request body on `/upload`, in bytes.
    /// Default: 20 MiB (Vertex AI inline data limit)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Settings for the upstream Vertex AI connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexConfig {
    /// Google Cloud project that owns the Vertex AI quota.
    /// Populated from `GOOGLE_CLOUD_PROJECT`; required in production.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Vertex AI region.
    /// Default: `us-central1`
    #[serde(default = "default_location")]
    pub location: String,

    /// Publisher model used for every description.
    /// Default: `gemini-2.0-flash-lite-001`
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL override. When unset, `https://{location}-aiplatform.googleapis.com`.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Upper bound on a single `generateContent` call, in seconds.
    /// Default: `60`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Instruction sent alongside every image.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

/// Settings for Google credential loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Path to a service account key or authorized user JSON file.
    /// Populated from `GOOGLE_APPLICATION_CREDENTIALS`; required in production.
    #[serde(default)]
    pub credentials_path: Option<String>,

    /// Number of seconds before expiration to trigger a token refresh.
    /// Default: `300` (5 minutes)
    #[serde(default = "default_refresh_buffer")]
    pub refresh_buffer_seconds: i64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Runtime wiring selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    /// Populated from `APP_ENV`.
    #[serde(default)]
    pub mode: RuntimeMode,
}

/// Selects the collaborators injected into the router at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Vertex AI client and Prometheus metrics.
    #[default]
    Production,
    /// Fixed-response stub client and no-op metrics.
    Test,
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Production => f.write_str("production"),
            RuntimeMode::Test => f.write_str("test"),
        }
    }
}

impl VertexConfig {
    /// Resolved API base URL for the configured region.
    pub fn base_url(&self) -> String {
        match &self.api_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: default_location(),
            model: default_model(),
            api_base_url: None,
            timeout_seconds: default_timeout(),
            prompt: default_prompt(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            refresh_buffer_seconds: default_refresh_buffer(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_location() -> String {
    "us-central1".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash-lite-001".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_prompt() -> String {
    "Describe esta imagen detalladamente en un párrafo coherente y fluido en español.".to_string()
}

fn default_refresh_buffer() -> i64 {
    300 // 5 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
