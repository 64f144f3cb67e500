//! Image description capability.
//!
//! The upload handler only sees [`ImageDescriber`], a trait object selected
//! once at startup: [`crate::vertex::VertexClient`] in production and
//! [`StubDescriber`] in test mode. [`describe_image`] performs the single
//! upstream call for an upload and folds the outcome into a
//! [`DescriptionResult`].
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod stub;

pub use stub::{StubDescriber, STUB_DESCRIPTION};

use crate::error::Result;
use crate::models::gemini::{GenerateContentResponse, InlineData};
use crate::vision::{to_inline_data, UploadRequest};
use async_trait::async_trait;
use tracing::{debug, error, warn};

/// Returned in place of a description when the model produced no text.
pub const FALLBACK_DESCRIPTION: &str = "Could not obtain an AI-generated description.";

const NORMAL_FINISH_REASON: &str = "STOP";

/// Prefix of the error surfaced to callers when the upstream call fails.
pub const GENERATION_ERROR_PREFIX: &str = "AI generation error: ";

/// A remote (or fake) multimodal model that can describe an image.
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Sends `prompt` and `image` to the model and returns its raw response.
    async fn generate_content(
        &self,
        prompt: &str,
        image: InlineData,
    ) -> Result<GenerateContentResponse>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Outcome of describing one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionResult {
    /// Text of the first candidate.
    Success { text: String },
    /// The call succeeded but yielded no usable text (e.g. safety-blocked).
    Empty { fallback: String },
    /// The call itself failed.
    Failure { reason: String },
}

impl DescriptionResult {
    /// Interprets a successful upstream response.
    pub fn from_response(response: &GenerateContentResponse) -> Self {
        let text = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.text())
            .filter(|text| !text.is_empty());

        match text {
            Some(text) => DescriptionResult::Success { text },
            None => {
                // STOP is a normal completion, not a block
                let finish_reason = response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
                    .filter(|reason| *reason != NORMAL_FINISH_REASON);
                let reason = response.block_reason().or(finish_reason);
                DescriptionResult::Empty {
                    fallback: fallback_description(reason),
                }
            }
        }
    }
}

/// Explanatory text for a generation without usable output.
pub fn fallback_description(reason: Option<&str>) -> String {
    match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{} Reason: {}", FALLBACK_DESCRIPTION, reason),
        None => FALLBACK_DESCRIPTION.to_string(),
    }
}

/// Describes `upload` with exactly one call to `describer`.
pub async fn describe_image(
    describer: &dyn ImageDescriber,
    prompt: &str,
    upload: &UploadRequest,
) -> DescriptionResult {
    let image = to_inline_data(upload);
    debug!(
        "Calling {} with {} bytes of {} ({} base64 chars)",
        describer.name(),
        upload.len(),
        upload.mime_type,
        image.data.len()
    );

    match describer.generate_content(prompt, image).await {
        Ok(response) => {
            let result = DescriptionResult::from_response(&response);
            if let DescriptionResult::Empty { fallback } = &result {
                warn!("Model returned no usable description: {}", fallback);
            }
            result
        }
        Err(e) => {
            error!("{} call failed: {}", describer.name(), e);
            DescriptionResult::Failure {
                reason: e.to_string(),
            }
        }
    }
}
