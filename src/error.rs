//! Error types for the img2lvgl library.
//!
//! A single fatal error type, [`Img2LvglError`], covers every way a request
//! can fail. Variants fall into three groups, reported by
//! [`Img2LvglError::kind`]:
//!
//! * **Input**: the image could not be obtained (no source, bad URL,
//!   download failure, wrong upload type).
//! * **Validation**: a parameter names a value outside the supported set.
//! * **Conversion**: the bytes were obtained but could not be decoded or
//!   encoded into the requested LVGL format.
//!
//! The HTTP layer does not distinguish them in the response (all become a
//! 500 with the message), but the kind is logged with every failure.

use std::fmt;
use thiserror::Error;

/// All fatal errors returned by the img2lvgl library.
#[derive(Debug, Error)]
pub enum Img2LvglError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Neither an upload nor a URL was supplied.
    #[error("No image file or URL provided")]
    MissingImage,

    /// The `url` parameter is not an absolute http(s) or data URL.
    #[error("Invalid URL '{url}': expected an absolute http/https URL or a data: URL")]
    InvalidUrl { url: String },

    /// The URL was valid but the download failed.
    #[error("Error downloading image from '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The URL answered with something other than a PNG or JPEG.
    #[error("URL '{url}' does not point to a JPG or PNG image (Content-Type: {content_type})")]
    UnsupportedContentType { url: String, content_type: String },

    /// The uploaded file was empty or had a disallowed extension.
    #[error("Invalid upload '{filename}': {reason}")]
    InvalidUpload { filename: String, reason: String },

    /// The image payload exceeds the configured size limit.
    #[error("Image is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    /// The multipart request body could not be read.
    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    // ── Validation errors ─────────────────────────────────────────────────
    /// `cf` does not name a supported color format.
    #[error("Invalid color format: {0}")]
    UnknownColorFormat(String),

    /// `output` does not name a supported output mode.
    #[error("Invalid output format: {0}")]
    UnknownOutput(String),

    /// `compress` does not name a supported compression method.
    #[error("Invalid compression: {0}")]
    UnknownCompression(String),

    /// The request parameters were not valid JSON.
    #[error("Invalid JSON in request parameters: {0}")]
    InvalidParams(String),

    /// Server configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The input bytes are not a decodable image.
    #[error("Error decoding image: {0}")]
    Decode(#[source] image::ImageError),

    /// Encoding the preview image failed.
    #[error("Error encoding image: {0}")]
    Encode(#[source] image::ImageError),

    /// LVGL headers store dimensions as u16.
    #[error("Image is {width}x{height} px; LVGL images are limited to 65535 px per side")]
    DimensionsTooLarge { width: u32, height: u32 },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Binding or serving the listener failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`Img2LvglError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Validation,
    Conversion,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Input => "input",
            ErrorKind::Validation => "validation",
            ErrorKind::Conversion => "conversion",
        })
    }
}

impl Img2LvglError {
    /// Which of the three failure groups this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use Img2LvglError::*;
        match self {
            MissingImage
            | InvalidUrl { .. }
            | DownloadFailed { .. }
            | DownloadTimeout { .. }
            | UnsupportedContentType { .. }
            | InvalidUpload { .. }
            | TooLarge { .. }
            | Multipart(_) => ErrorKind::Input,
            UnknownColorFormat(_)
            | UnknownOutput(_)
            | UnknownCompression(_)
            | InvalidParams(_)
            | InvalidConfig(_) => ErrorKind::Validation,
            Decode(_) | Encode(_) | DimensionsTooLarge { .. } | Io(_) | Internal(_) => {
                ErrorKind::Conversion
            }
        }
    }
}
