//! Structured logging and security-focused trace utilities.
//!
//! This module configures the `tracing` ecosystem for the application,
//! supporting multiple output formats and providing utilities to prevent
//! sensitive data (access tokens, private keys) from leaking into logs.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the application.
///
/// Supports three output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: Single-line output.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    // Configure filter from environment or config file
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Sanitizes sensitive information from log messages.
///
/// Replaces every Google OAuth2 access token (`ya29.` prefix), refresh token
/// (`1//0` prefix) and PEM private key block with a `\[REDACTED\]` placeholder.
/// Upstream error bodies pass through here before they are logged.
pub fn sanitize(input: &str) -> String {
    let mut result = redact_pem_blocks(input);
    result = redact_prefixed(&result, "ya29.", "[REDACTED_ACCESS_TOKEN]");
    redact_prefixed(&result, "1//0", "[REDACTED_REFRESH_TOKEN]")
}

fn is_token_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '"' || c == '\'' || c == ',' || c == '}'
}

fn redact_prefixed(input: &str, prefix: &str, placeholder: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(prefix) {
        result.push_str(&rest[..pos]);
        result.push_str(placeholder);
        let token = &rest[pos..];
        let end = token.find(is_token_delimiter).unwrap_or(token.len());
        rest = &token[end..];
    }

    result.push_str(rest);
    result
}

fn redact_pem_blocks(input: &str) -> String {
    const BEGIN: &str = "-----BEGIN";
    const END_MARKER: &str = "PRIVATE KEY-----";

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(BEGIN) {
        result.push_str(&rest[..start]);
        let block = &rest[start..];
        // The END line carries the marker a second time
        let end = block
            .match_indices(END_MARKER)
            .nth(1)
            .map(|(i, m)| i + m.len())
            .unwrap_or(block.len());
        result.push_str("[REDACTED_PRIVATE_KEY]");
        rest = &block[end..];
    }

    result.push_str(rest);
    result
}
