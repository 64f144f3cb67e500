//! Axum-based HTTP server for the imgdesc gateway.
//!
//! This module sets up the HTTP server, configures routes, and handles
//! incoming uploads, bridging them to the configured image describer.
//!
//! # Components
//!
//! - `handlers`: `POST /upload` and `GET /metrics`.
//! - `middleware`: Request ID tracking and request duration metrics.
//! - `routes`: Runtime wiring and the router that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::{
    DescriptionResponse, ErrorResponse, MessageResponse, IMAGE_FIELD, METRICS_PATH,
    NO_FILE_MESSAGE, UPLOAD_PATH,
};
pub use routes::{create_router, AppState};
