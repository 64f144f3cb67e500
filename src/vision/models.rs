// Vision models and types
// Author: kelexine (https://github.com/kelexine)

use bytes::Bytes;

/// Fallback MIME type when neither the client nor the magic bytes name one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// One uploaded image, alive for the duration of a single request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub image_bytes: Bytes,
    pub mime_type: String,
    /// Informational only.
    pub original_filename: Option<String>,
}

impl UploadRequest {
    /// Builds an upload, resolving the MIME type from the declared content
    /// type, then the magic bytes, then [`DEFAULT_MIME_TYPE`].
    pub fn new(
        image_bytes: Bytes,
        declared_mime: Option<&str>,
        original_filename: Option<String>,
    ) -> Self {
        let mime_type = declared_mime
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| ImageFormat::detect(&image_bytes).map(|f| f.mime_type().to_string()))
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        Self {
            image_bytes,
            mime_type,
            original_filename,
        }
    }

    pub fn len(&self) -> usize {
        self.image_bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_bytes.is_empty()
    }
}

/// Image formats recognised from their magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Heic,
}

impl ImageFormat {
    /// Get MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Heic => "image/heic",
        }
    }

    /// Detect format from magic bytes at start of image data
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\xFF\xD8\xFF") {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if data.len() >= 12 && data.starts_with(b"RIFF") && data[8..12] == *b"WEBP" {
            Some(ImageFormat::WebP)
        } else if data.len() >= 12 && (data[4..12] == *b"ftypheic" || data[4..12] == *b"ftypheix")
        {
            Some(ImageFormat::Heic)
        } else {
            None
        }
    }
}
