// Vision translation logic
// Author: kelexine (https://github.com/kelexine)

use super::models::UploadRequest;
use crate::models::gemini::InlineData;
use base64::Engine;

/// Translate an uploaded image into Gemini `InlineData`.
///
/// Gemini expects bare base64 (no `data:image/png;base64,` prefix).
pub fn to_inline_data(upload: &UploadRequest) -> InlineData {
    InlineData {
        mime_type: upload.mime_type.clone(),
        data: base64::engine::general_purpose::STANDARD.encode(&upload.image_bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_inline_data_from_upload() {
        let upload = UploadRequest::new(
            Bytes::from_static(b"fake image data"),
            Some("image/jpeg"),
            Some("fake_image.jpg".to_string()),
        );

        let inline = to_inline_data(&upload);
        assert_eq!(inline.mime_type, "image/jpeg");
        assert_eq!(inline.data, "ZmFrZSBpbWFnZSBkYXRh");
    }

    #[test]
    fn test_inline_data_keeps_binary_intact() {
        // Tiny 1x1 PNG
        let png_data = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";
        let bytes = base64::engine::general_purpose::STANDARD.decode(png_data).unwrap();

        let upload = UploadRequest::new(Bytes::from(bytes), None, None);
        let inline = to_inline_data(&upload);

        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, png_data);
    }
}
