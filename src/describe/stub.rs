// Fixed-response describer used in test mode
// Author: kelexine (https://github.com/kelexine)

use super::ImageDescriber;
use crate::error::Result;
use crate::models::gemini::{GenerateContentResponse, InlineData};
use async_trait::async_trait;

pub const STUB_DESCRIPTION: &str = "Test description generated by stub.";

/// Answers every request with the same single-candidate response, without
/// touching the network.
#[derive(Debug, Clone)]
pub struct StubDescriber {
    text: String,
}

impl StubDescriber {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for StubDescriber {
    fn default() -> Self {
        Self::with_text(STUB_DESCRIPTION)
    }
}

#[async_trait]
impl ImageDescriber for StubDescriber {
    async fn generate_content(
        &self,
        _prompt: &str,
        _image: InlineData,
    ) -> Result<GenerateContentResponse> {
        Ok(GenerateContentResponse::from_text_parts([self.text.as_str()]))
    }

    fn name(&self) -> &str {
        "stub"
    }
}
