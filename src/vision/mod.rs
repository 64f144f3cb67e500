//! Uploaded image handling.
//!
//! This module turns the raw bytes of an upload into the `InlineData` part
//! Gemini expects. It includes MIME type detection from magic bytes for
//! clients that do not declare a content type.
//!
//! # Submodules
//!
//! - `models`: The per-request upload type and image format detection.
//! - `translation`: Base64 encoding into Gemini's inline data format.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod models;
pub mod translation;

pub use models::{ImageFormat, UploadRequest};
pub use translation::to_inline_data;
