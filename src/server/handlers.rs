// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::describe::{describe_image, DescriptionResult, GENERATION_ERROR_PREFIX};
use crate::error::{GatewayError, Result};
use crate::metrics::CallStatus;
use crate::vision::UploadRequest;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const UPLOAD_PATH: &str = "/upload";
pub const METRICS_PATH: &str = "/metrics";

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

pub const NO_FILE_MESSAGE: &str = "no file uploaded";

/// Body of 400/413 upload rejections.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of a 200 upload response.
#[derive(Debug, Serialize, Deserialize)]
pub struct DescriptionResponse {
    pub success: bool,
    pub description: String,
}

/// Body of a 500 upload response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn reject(status: StatusCode, message: impl Into<String>) -> Response {
    let body = MessageResponse {
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

/// Handler for `POST /upload`
///
/// Reads the `image` file part, asks the describer for a description and
/// records the upload and AI call outcomes.
pub async fn upload_handler(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    info!("POST {} received", UPLOAD_PATH);

    let upload = match read_upload(multipart, state.max_upload_bytes).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            warn!("No file uploaded on {}", UPLOAD_PATH);
            state.metrics.record_upload(CallStatus::Fail);
            return reject(StatusCode::BAD_REQUEST, NO_FILE_MESSAGE);
        }
        Err(e) => {
            warn!("Upload rejected: {}", e);
            state.metrics.record_upload(CallStatus::Fail);
            return reject(e.status_code(), e.to_string());
        }
    };

    info!(
        "File received: {}, type: {}, size: {} bytes",
        upload.original_filename.as_deref().unwrap_or("<unnamed>"),
        upload.mime_type,
        upload.len()
    );

    match describe_image(state.describer.as_ref(), &state.prompt, &upload).await {
        DescriptionResult::Success { text } => {
            state.metrics.record_upload(CallStatus::Success);
            state.metrics.record_ai_call(CallStatus::Success);
            Json(DescriptionResponse {
                success: true,
                description: text,
            })
            .into_response()
        }
        DescriptionResult::Empty { fallback } => {
            state.metrics.record_upload(CallStatus::Success);
            state.metrics.record_ai_call(CallStatus::Fail);
            Json(DescriptionResponse {
                success: true,
                description: fallback,
            })
            .into_response()
        }
        DescriptionResult::Failure { reason } => {
            state.metrics.record_upload(CallStatus::Fail);
            state.metrics.record_ai_call(CallStatus::Fail);
            let body = ErrorResponse {
                success: false,
                error: format!("{}{}", GENERATION_ERROR_PREFIX, reason),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Pulls the first `image` file part out of the request.
///
/// Parts without a filename are form fields, not files, and are skipped.
/// A missing or malformed multipart body yields `Ok(None)`; only an
/// oversized body is an error.
async fn read_upload(
    multipart: std::result::Result<Multipart, MultipartRejection>,
    max_upload_bytes: usize,
) -> Result<Option<UploadRequest>> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!("Not a multipart request: {}", rejection);
            return Ok(None);
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(GatewayError::PayloadTooLarge(max_upload_bytes));
            }
            Err(e) => {
                debug!("Malformed multipart body: {}", e.body_text());
                return Ok(None);
            }
        };

        if field.name() != Some(IMAGE_FIELD) || field.file_name().is_none() {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        return match field.bytes().await {
            Ok(bytes) => Ok(Some(UploadRequest::new(
                bytes,
                content_type.as_deref(),
                filename,
            ))),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(GatewayError::PayloadTooLarge(max_upload_bytes))
            }
            Err(e) => {
                debug!("Failed to read {} part: {}", IMAGE_FIELD, e.body_text());
                Ok(None)
            }
        };
    }
}

/// Handler for `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response> {
    debug!("GET {} received, serving metrics", METRICS_PATH);

    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, state.metrics.content_type())], body).into_response())
}
