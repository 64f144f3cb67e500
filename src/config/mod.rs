// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::cli::Args;
use crate::error::{GatewayError, Result};
use config::{Config, Environment, File, Map};
use std::path::PathBuf;

/// Environment variables read outside the `IMGDESC_` namespace, with the key
/// each one overrides.
const WELL_KNOWN_VARS: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("GOOGLE_CLOUD_PROJECT", "vertex.project_id"),
    ("GOOGLE_APPLICATION_CREDENTIALS", "auth.credentials_path"),
    ("APP_ENV", "runtime.mode"),
];

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. CLI arguments (highest)
    /// 2. Well-known variables (`PORT`, `GOOGLE_CLOUD_PROJECT`, ...)
    /// 3. `IMGDESC_` prefixed environment variables
    /// 4. Config file
    /// 5. Defaults (lowest)
    pub fn load(args: &Args) -> Result<Self> {
        let vars: Map<String, String> = std::env::vars().collect();
        Self::load_from(args, vars)
    }

    /// Same as [`AppConfig::load`], reading variables from `vars` instead of
    /// the process environment.
    pub fn load_from(args: &Args, vars: Map<String, String>) -> Result<Self> {
        let file_path = args
            .config
            .clone()
            .unwrap_or_else(Self::default_config_path);

        let mut builder = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Load from config file if it exists; an explicit --config must exist
            .add_source(File::from(file_path).required(args.config.is_some()))
            // Override with environment variables (e.g. IMGDESC_SERVER__PORT)
            .add_source(
                Environment::with_prefix("IMGDESC")
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(vars.clone())),
            );

        for (var, key) in WELL_KNOWN_VARS {
            let value = vars.get(*var).filter(|v| !v.trim().is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        let mut config: AppConfig = builder
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        if let Some(port) = args.port {
            config.server.port = port;
        }
        if let Some(mode) = args.mode {
            config.runtime.mode = mode;
        }

        Ok(config)
    }

    /// Checks the settings production wiring cannot start without.
    pub fn validate(&self) -> Result<()> {
        if self.runtime.mode == RuntimeMode::Test {
            return Ok(());
        }

        if self.auth.credentials_path.is_none() {
            return Err(GatewayError::Config(
                "GOOGLE_APPLICATION_CREDENTIALS is not set".to_string(),
            ));
        }

        if self.vertex.project_id.is_none() {
            return Err(GatewayError::Config(
                "GOOGLE_CLOUD_PROJECT is not set".to_string(),
            ));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(GatewayError::Config(
                "server.max_upload_bytes must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".imgdesc")
            .join("config.toml")
    }
}
