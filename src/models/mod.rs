// Wire models for the upstream generative API
// Author: kelexine (https://github.com/kelexine)

pub mod gemini;

pub use gemini::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
    PromptFeedback, UsageMetadata,
};
