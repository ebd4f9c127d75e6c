//! HTTP surface: `POST /convert`, `GET /formats`, `GET /`.
//!
//! `/convert` takes either a JSON body naming a `url`, or a multipart form
//! with an `image` file plus parameters (individual text fields and/or a
//! `params` field holding the JSON object). An upload wins over a `url`.
//!
//! Every failure becomes `500 text/plain` carrying the error message; the
//! error kind only shows up in the logs.

use crate::config::ServerConfig;
use crate::convert::convert_blocking;
use crate::error::{ErrorKind, Img2LvglError};
use crate::format::{ColorFormat, Compression, OutputMode, RequestedFormat};
use crate::output::ConversionOutput;
use crate::pipeline::input;
use crate::request::ConvertParams;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, Img2LvglError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("img2lvgl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Img2LvglError::Internal(format!("HTTP client: {}", e)))?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

/// An uploaded `image` field.
struct Upload {
    filename: Option<String>,
    bytes: Vec<u8>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/formats", get(formats))
        .route("/convert", post(convert))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

/// Bind `config.socket_addr()` and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), Img2LvglError> {
    let addr = config.socket_addr();
    let state = AppState::new(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn convert(State(state): State<AppState>, request: Request) -> Response {
    match handle_convert(&state, request).await {
        Ok(output) => conversion_response(output),
        Err(e) => e.into_response(),
    }
}

async fn handle_convert(
    state: &AppState,
    request: Request,
) -> Result<ConversionOutput, Img2LvglError> {
    let config = &state.config;
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"));

    let (params, upload) = if is_multipart {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| Img2LvglError::Multipart(e.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let body = axum::body::to_bytes(request.into_body(), config.max_upload_bytes)
            .await
            .map_err(|e| Img2LvglError::InvalidParams(format!("unreadable body: {}", e)))?;
        let params = if body.iter().all(u8::is_ascii_whitespace) {
            ConvertParams::default()
        } else {
            ConvertParams::from_json(&body)?
        };
        (params, None)
    };

    let options = params.to_options(&config.array_name)?;

    let bytes = match (upload, params.url.as_deref().map(str::trim)) {
        (Some(upload), _) => {
            input::validate_upload(
                upload.filename.as_deref(),
                &upload.bytes,
                config.max_upload_bytes,
            )?;
            info!(
                "Received upload {:?} ({} bytes)",
                upload.filename.as_deref().unwrap_or(""),
                upload.bytes.len()
            );
            upload.bytes
        }
        (None, Some(url)) if !url.is_empty() => {
            input::resolve_url(
                &state.client,
                url,
                config.download_timeout_secs,
                config.max_upload_bytes,
            )
            .await?
        }
        _ => return Err(Img2LvglError::MissingImage),
    };

    convert_blocking(bytes, options).await
}

/// Collect form fields. The `params` JSON wins over individual fields it sets.
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(ConvertParams, Option<Upload>), Img2LvglError> {
    let mut fields = ConvertParams::default();
    let mut json = None;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Img2LvglError::Multipart(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Img2LvglError::Multipart(e.body_text()))?;
                upload = Some(Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            "params" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Img2LvglError::Multipart(e.body_text()))?;
                if !text.trim().is_empty() {
                    json = Some(ConvertParams::from_json(text.as_bytes())?);
                }
            }
            _ => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Img2LvglError::Multipart(e.body_text()))?;
                fields.set_field(&name, text);
            }
        }
    }

    let params = match json {
        Some(json) => json.or(fields),
        None => fields,
    };
    Ok((params, upload))
}

fn conversion_response(output: ConversionOutput) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", output.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, output.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.body.into_bytes(),
    )
        .into_response()
}

impl IntoResponse for Img2LvglError {
    fn into_response(self) -> Response {
        match self.kind() {
            ErrorKind::Conversion => {
                error!(kind = %self.kind(), "Conversion failed: {}", self)
            }
            kind => warn!(kind = %kind, "Request rejected: {}", self),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

async fn formats() -> Json<Value> {
    let color_formats: Vec<&str> = ColorFormat::ALL.iter().map(|cf| cf.name()).collect();
    let compression: Vec<&str> = Compression::ALL.iter().map(|c| c.name()).collect();

    Json(json!({
        "color_formats": color_formats,
        "legacy_color_formats": RequestedFormat::LEGACY_NAMES,
        "output_formats": OutputMode::NAMES,
        "compression_options": compression,
        "api": {
            "url_endpoint": {
                "method": "POST",
                "url": "/convert",
                "content_type": "application/json",
                "parameters": {
                    "url": "URL of a PNG or JPEG image, or a base64 data: URL",
                    "cf": "Color format (e.g. RGB565A8); default RGB565",
                    "output": "Output format (bin, bin_565, bin_565_swap, bin_888, c_array, image); default bin",
                    "maxSize": "Max dimensions as WIDTHxHEIGHT (e.g. \"800x480\") or {width: 800, height: 480}",
                    "dither": "Apply dithering (boolean; alias: dithering)",
                    "bigEndian": "Swap bytes of 16-bit colors (boolean)",
                    "compress": "Compression method (NONE, RLE, LZ4; alias: compression)"
                },
                "example": {
                    "url": "https://example.com/image.png",
                    "cf": "RGB565A8",
                    "output": "bin",
                    "maxSize": "800x480",
                    "dither": true,
                    "compress": "NONE"
                }
            },
            "file_upload_endpoint": {
                "method": "POST",
                "url": "/convert",
                "content_type": "multipart/form-data",
                "parameters": {
                    "image": "Image file (JPG or PNG)",
                    "params": "JSON string with the same parameters as the URL endpoint"
                }
            }
        }
    }))
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": "LVGL Image Converter API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Resize and convert images to LVGL format",
        "endpoints": {
            "/convert": "POST - Convert an image (JSON or file upload)",
            "/formats": "GET - List available formats and API documentation"
        },
        "usage": "See /formats for detailed API documentation"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_is_plain_500() {
        let resp = Img2LvglError::MissingImage.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn formats_lists_everything() {
        let Json(v) = formats().await;
        assert_eq!(v["color_formats"].as_array().unwrap().len(), ColorFormat::ALL.len());
        assert!(v["output_formats"]
            .as_array()
            .unwrap()
            .iter()
            .any(|o| o == "c_array"));
        assert_eq!(v["compression_options"][2], "LZ4");
    }
}
