// Vertex AI generateContent client
// Author: kelexine (https://github.com/kelexine)

use crate::auth::TokenManager;
use crate::config::VertexConfig;
use crate::describe::ImageDescriber;
use crate::error::{GatewayError, Result};
use crate::models::gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
};
use crate::utils::logging::sanitize;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

/// Client for the Vertex AI Gemini `generateContent` endpoint.
///
/// Holds a pooled HTTP client and a [`TokenManager`] for bearer tokens.
/// Every call is bounded by `vertex.timeout_seconds`; no retries are made.
pub struct VertexClient {
    http_client: Client,
    tokens: TokenManager,
    endpoint: String,
    model: String,
}

impl VertexClient {
    /// Create a new Vertex client for the configured project, region and model.
    pub fn new(config: &VertexConfig, tokens: TokenManager) -> Result<Self> {
        let project_id = config.project_id.as_deref().ok_or_else(|| {
            GatewayError::Config("GOOGLE_CLOUD_PROJECT is not set".to_string())
        })?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            config.base_url(),
            project_id,
            config.location,
            config.model
        );

        info!(
            "Vertex AI client initialized for project \"{}\" in \"{}\" with model \"{}\"",
            project_id, config.location, config.model
        );

        Ok(Self {
            http_client,
            tokens,
            endpoint,
            model: config.model.clone(),
        })
    }

    /// One user turn: the instruction followed by the image.
    pub fn build_request(prompt: &str, image: InlineData) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::text(prompt),
                Part::InlineData { inline_data: image },
            ])],
        }
    }

    /// Extract error message from API response JSON
    fn extract_error_message(response_text: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        let error = serde_json::from_str::<ErrorResponse>(response_text)
            .ok()?
            .error?;
        error.message.or(error.status)
    }
}

#[async_trait]
impl ImageDescriber for VertexClient {
    async fn generate_content(
        &self,
        prompt: &str,
        image: InlineData,
    ) -> Result<GenerateContentResponse> {
        debug!("Calling generateContent for model: {}", self.model);

        let request = Self::build_request(prompt, image);
        let access_token = self.tokens.get_token().await?;

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Generation(format!("HTTP error: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| GatewayError::Generation(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            error!(
                "Vertex AI error: HTTP {} - Response body: {}",
                status,
                sanitize(&response_text)
            );
            let message = Self::extract_error_message(&response_text)
                .unwrap_or_else(|| response_text.clone());
            return Err(GatewayError::Generation(format!("HTTP {}: {}", status.as_u16(), message)));
        }

        debug!(
            "Raw Vertex response (first 500 chars): {}",
            response_text.chars().take(500).collect::<String>()
        );

        serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse Vertex response: {}", e);
            GatewayError::Generation(format!("Response parsing error: {}", e))
        })
    }

    fn name(&self) -> &str {
        "vertex"
    }
}
