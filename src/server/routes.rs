// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{metrics_handler, upload_handler, METRICS_PATH, UPLOAD_PATH};
use super::middleware::{request_id_layers, track_request_duration};
use crate::auth::TokenManager;
use crate::config::{AppConfig, RuntimeMode};
use crate::describe::{ImageDescriber, StubDescriber};
use crate::error::Result;
use crate::metrics::{MetricsRecorder, NoopMetrics, PrometheusMetrics};
use crate::vertex::VertexClient;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub describer: Arc<dyn ImageDescriber>,
    pub metrics: Arc<dyn MetricsRecorder>,
    pub prompt: Arc<str>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        describer: Arc<dyn ImageDescriber>,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        Self {
            describer,
            metrics,
            prompt: Arc::from(config.vertex.prompt.as_str()),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }

    /// Wires the collaborators for the configured runtime mode.
    ///
    /// Production requires Google credentials and a project id and fails
    /// fast without them; test mode never touches the network.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match config.runtime.mode {
            RuntimeMode::Production => {
                config.validate()?;
                let tokens = TokenManager::load(&config.auth)?;
                let client = VertexClient::new(&config.vertex, tokens)?;
                let metrics = PrometheusMetrics::new()?;
                info!("Prometheus metrics registered");
                Ok(Self::new(config, Arc::new(client), Arc::new(metrics)))
            }
            RuntimeMode::Test => {
                warn!("Test mode: using stub describer and no-op metrics");
                Ok(Self::new(
                    config,
                    Arc::new(StubDescriber::default()),
                    Arc::new(NoopMetrics),
                ))
            }
        }
    }
}

pub fn create_router(config: &AppConfig, state: AppState) -> Result<Router> {
    let (set_request_id, propagate_request_id) = request_id_layers();

    info!("Serving static files from {}", config.server.static_dir);
    let static_files = ServeDir::new(&config.server.static_dir);

    let app = Router::new()
        .route(METRICS_PATH, get(metrics_handler))
        .route(UPLOAD_PATH, post(upload_handler))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_request_duration,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
