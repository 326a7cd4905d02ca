use async_trait::async_trait;
use base64::Engine as _;

use super::VisionError;

/// Maximum accepted image size after base64 decoding (4 MB).
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// A validated, base64-encoded raster image ready for the vision API.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub base64_data: String,
}

impl EncodedImage {
    /// Build from a client payload: either a `data:image/...;base64,` URL or
    /// a bare base64 string. Validates the base64, the magic bytes, and the
    /// decoded size.
    pub fn from_data_url(data_url: &str) -> Result<Self, ImageDecodeError> {
        let base64_data = match data_url.find(',') {
            Some(idx) => &data_url[idx + 1..],
            None => data_url,
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(base64_data.trim())
            .map_err(|e| ImageDecodeError::Base64(e.to_string()))?;

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageDecodeError::TooLarge(bytes.len()));
        }

        let mime_type = detect_mime_type(&bytes).ok_or(ImageDecodeError::UnsupportedFormat)?;

        Ok(Self {
            mime_type,
            base64_data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageDecodeError {
    #[error("base64 decode failed: {0}")]
    Base64(String),
    #[error("image exceeds the 4 MB size limit ({0} bytes)")]
    TooLarge(usize),
    #[error("unsupported image format (expected JPEG, PNG, or WEBP)")]
    UnsupportedFormat,
}

/// Detect the image MIME type from magic bytes.
fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
        Some("image/jpeg")
    } else if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Hosted vision model abstraction (allows mocking).
///
/// Both methods return the model's raw text reply; parsing it into
/// structured fields is the analysis layer's job.
#[async_trait]
pub trait VisionModelClient: Send + Sync {
    /// Send an image plus the extraction prompt.
    async fn analyze_image(
        &self,
        image: &EncodedImage,
        prompt: &str,
    ) -> Result<String, VisionError>;

    /// Text-only variant for clients that pre-extract the prescription text.
    async fn analyze_text(&self, prompt: &str) -> Result<String, VisionError>;
}
