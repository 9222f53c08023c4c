//! Transport-encoded images handed to the vision model.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// A base64-encoded image with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// MIME type (e.g., "image/png")
    pub mime_type: String,

    /// Base64 payload (standard alphabet, padded)
    pub data: String,
}

impl EncodedImage {
    /// Encode raw image file bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Encode PNG file bytes.
    pub fn png(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes, "image/png")
    }

    /// Encode JPEG file bytes.
    pub fn jpeg(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes, "image/jpeg")
    }

    /// Encode bytes, sniffing the MIME type from the magic bytes.
    pub fn sniffed(bytes: &[u8]) -> Option<Self> {
        detect_mime_type(bytes).map(|mime| Self::from_bytes(bytes, mime))
    }

    /// `data:` URL form accepted by multimodal chat APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Length of the base64 payload.
    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }

    /// Decode the payload back into raw bytes.
    pub fn decode(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.data).ok()
    }
}

/// Detect an image MIME type from magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let image = EncodedImage::png(b"abc");
        assert_eq!(image.data, "YWJj");
        assert_eq!(image.data_url(), "data:image/png;base64,YWJj");
        assert_eq!(image.decode().unwrap(), b"abc");
    }

    #[test]
    fn test_detect_mime_type() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(detect_mime_type(&jpeg), Some("image/jpeg"));

        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime_type(&png), Some("image/png"));

        assert_eq!(detect_mime_type(&[0, 0, 0, 0]), None);
    }

    #[test]
    fn test_sniffed() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0];
        assert_eq!(EncodedImage::sniffed(&jpeg).unwrap().mime_type, "image/jpeg");
        assert!(EncodedImage::sniffed(b"plain text").is_none());
    }
}
