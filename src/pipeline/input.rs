//! Input acquisition: turn a `url` parameter or an upload into image bytes.
//!
//! Everything stays in memory. Downloads are bounded by the configured
//! timeout and size limit, and a response that declares a non-image
//! `Content-Type` is refused before its body is read.

use crate::error::Img2LvglError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info};

/// Extensions accepted for uploaded files.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Check if the input string looks like an http(s) URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Check if the input string is a `data:` URL.
pub fn is_data_url(input: &str) -> bool {
    input
        .get(..5)
        .is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

/// Resolve a `url` parameter to bytes: decode `data:` URLs in place,
/// download everything else.
pub async fn resolve_url(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
    limit: usize,
) -> Result<Vec<u8>, Img2LvglError> {
    let url = url.trim();
    if is_data_url(url) {
        decode_data_url(url, limit)
    } else if is_url(url) {
        download_url(client, url, timeout_secs, limit).await
    } else {
        Err(Img2LvglError::InvalidUrl {
            url: url.to_string(),
        })
    }
}

/// Download an image, enforcing status, content type, timeout and size.
async fn download_url(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
    limit: usize,
) -> Result<Vec<u8>, Img2LvglError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| Img2LvglError::InvalidUrl {
        url: url.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Img2LvglError::InvalidUrl {
            url: url.to_string(),
        });
    }

    info!("Downloading image from: {}", url);

    let response = client
        .get(parsed)
        .timeout(Duration::from_secs(timeout_secs))
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                Img2LvglError::DownloadTimeout {
                    url: url.to_string(),
                    secs: timeout_secs,
                }
            } else {
                Img2LvglError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

    if !response.status().is_success() {
        return Err(Img2LvglError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    if let Some(content_type) = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        if !is_supported_mime(content_type) {
            return Err(Img2LvglError::UnsupportedContentType {
                url: url.to_string(),
                content_type: content_type.to_string(),
            });
        }
    }

    if let Some(len) = response.content_length() {
        check_limit(len as usize, limit)?;
    }

    let fetch_error = |e: reqwest::Error| {
        if e.is_timeout() {
            Img2LvglError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Img2LvglError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    // Content-Length is optional; the running total is what bounds memory.
    let mut bytes = Vec::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(fetch_error)?;
        check_limit(bytes.len() + chunk.len(), limit)?;
        bytes.extend_from_slice(&chunk);
    }

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes)
}

/// Decode `data:<mime>;base64,<payload>`.
fn decode_data_url(url: &str, limit: usize) -> Result<Vec<u8>, Img2LvglError> {
    let invalid = || Img2LvglError::InvalidUrl {
        url: truncate(url, 64),
    };

    let (meta, payload) = url[5..].split_once(',').ok_or_else(invalid)?;
    let mut parts = meta.split(';');
    let mime = parts.next().unwrap_or("");
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(invalid());
    }
    if !mime.is_empty() && !is_supported_mime(mime) {
        return Err(Img2LvglError::UnsupportedContentType {
            url: truncate(url, 64),
            content_type: mime.to_string(),
        });
    }

    let bytes = STANDARD.decode(payload.trim()).map_err(|_| invalid())?;
    check_limit(bytes.len(), limit)?;
    debug!("Decoded data URL → {} bytes", bytes.len());
    Ok(bytes)
}

/// Validate an uploaded file's name and size.
pub fn validate_upload(
    filename: Option<&str>,
    bytes: &[u8],
    limit: usize,
) -> Result<(), Img2LvglError> {
    let name = filename.unwrap_or("").to_string();

    if let Some(f) = filename.filter(|f| !f.is_empty()) {
        let allowed = f
            .rsplit_once('.')
            .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !allowed {
            return Err(Img2LvglError::InvalidUpload {
                filename: name,
                reason: "Invalid file type. Only JPG and PNG are supported.".into(),
            });
        }
    }
    if bytes.is_empty() {
        return Err(Img2LvglError::InvalidUpload {
            filename: name,
            reason: "file is empty".into(),
        });
    }
    check_limit(bytes.len(), limit)
}

/// MIME type of an encoded image, judged from its magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        _ => None,
    }
}

fn is_supported_mime(content_type: &str) -> bool {
    let ct = content_type.trim().to_ascii_lowercase();
    ["image/png", "image/jpeg", "image/jpg"]
        .iter()
        .any(|m| ct.starts_with(m))
}

fn check_limit(size: usize, limit: usize) -> Result<(), Img2LvglError> {
    if size > limit {
        Err(Img2LvglError::TooLarge { size, limit })
    } else {
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}…", &s[..i]),
        None => s.to_string(),
    }
}
