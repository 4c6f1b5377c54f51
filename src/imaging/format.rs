//! Image kind resolution.
//!
//! The declared `mimeType` wins. Without one, the type is guessed from the
//! URI: the media type of a `data:` URI, or the file extension otherwise.
//! Only PNG and JPEG are re-encoded; anything else aborts the run.

use crate::container::data_uri_mime_type;
use std::path::Path;
use thiserror::Error;

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Image is missing MIME type and has no URI - unable to determine image type")]
    Undetermined,
    #[error("Unsupported image MIME type: {}", .0.as_deref().unwrap_or("unknown"))]
    Unsupported(Option<String>),
}

/// The two encodings the optimizer knows how to re-encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Lossless, re-encoded with maximum compression.
    Png,
    /// Lossy, re-encoded at the configured quality.
    Jpeg,
}

impl ImageKind {
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            MIME_PNG => Some(ImageKind::Png),
            MIME_JPEG => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageKind::Png => MIME_PNG,
            ImageKind::Jpeg => MIME_JPEG,
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            ImageKind::Png => image::ImageFormat::Png,
            ImageKind::Jpeg => image::ImageFormat::Jpeg,
        }
    }

    /// Resolve from a declared MIME type, falling back to the URI.
    pub fn resolve(mime_type: Option<&str>, uri: Option<&str>) -> Result<Self, FormatError> {
        let mime = match (mime_type, uri) {
            (Some(mime), _) => Some(mime),
            (None, Some(uri)) => guess_mime_type(uri),
            (None, None) => return Err(FormatError::Undetermined),
        };
        mime.and_then(Self::from_mime_type)
            .ok_or_else(|| FormatError::Unsupported(mime.map(str::to_string)))
    }
}

/// Guess a MIME type from a URI's media type or file extension.
pub fn guess_mime_type(uri: &str) -> Option<&str> {
    if uri.starts_with("data:") {
        return data_uri_mime_type(uri);
    }
    // Query strings and fragments are not part of the extension
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(MIME_PNG),
        "jpg" | "jpeg" | "jpe" => Some(MIME_JPEG),
        "webp" => Some("image/webp"),
        "ktx2" => Some("image/ktx2"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}
