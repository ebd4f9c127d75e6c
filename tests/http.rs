//! HTTP-level tests for the `/convert`, `/formats` and `/` routes.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`. URL
//! sources are served by a second axum app bound to an ephemeral port on
//! 127.0.0.1, so no external network access is needed.
//!
//! Run with:
//!   cargo test --test http

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, Rgba, RgbaImage};
use img2lvgl::{router, AppState, ServerConfig};
use std::io::Cursor;
use std::net::SocketAddr;
use tower::ServiceExt;

// ── Test helpers ─────────────────────────────────────────────────────────────

const BOUNDARY: &str = "img2lvgl-test-boundary";

fn sample_png(w: u32, h: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x * 7) as u8, (y * 5) as u8, ((x + y) * 3) as u8, 255])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn app() -> Router {
    router(AppState::new(ServerConfig::default()).unwrap())
}

const CHUNK: usize = 256 * 1024;

/// Serve a 200x100 PNG at `/logo.png`, HTML at `/page.html`, 2 MiB of
/// chunked "PNG" without a Content-Length at `/huge.png`, 404 elsewhere.
async fn fixture_server() -> SocketAddr {
    let png = sample_png(200, 100);
    let app = Router::new()
        .route(
            "/logo.png",
            get(move || {
                let png = png.clone();
                async move { ([(header::CONTENT_TYPE, "image/png")], png).into_response() }
            }),
        )
        .route(
            "/page.html",
            get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html></html>") }),
        )
        .route(
            "/huge.png",
            get(|| async {
                let chunks = futures::stream::iter(
                    (0..8).map(|_| Ok::<_, std::io::Error>(vec![0u8; CHUNK])),
                );
                (
                    [(header::CONTENT_TYPE, "image/png")],
                    Body::from_stream(chunks),
                )
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn json_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/convert")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a multipart body from `(name, filename, bytes)` parts.
fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, filename, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String, Vec<u8>) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

fn header_dims(bin: &[u8]) -> (u16, u16) {
    (
        u16::from_le_bytes([bin[4], bin[5]]),
        u16::from_le_bytes([bin[6], bin[7]]),
    )
}

// ── /convert with a URL ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_url_to_indexed_c_array() {
    let addr = fixture_server().await;
    let (status, ct, body) = send(
        app(),
        json_request(serde_json::json!({
            "url": format!("http://{addr}/logo.png"),
            "cf": "CF_INDEXED",
            "output": "c_array",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(ct.starts_with("text/plain"), "content type {ct}");
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("lvgl_image_map[]"));
    assert!(text.contains(".header.w = 200,"));
}

#[tokio::test]
async fn test_url_to_bin_defaults() {
    let addr = fixture_server().await;
    let resp = app()
        .oneshot(json_request(serde_json::json!({
            "url": format!("http://{addr}/logo.png"),
        })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"output.bin\""
    );
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body[0], 0x19);
    assert_eq!(body[1], 0x12); // RGB565
    assert_eq!(header_dims(&body), (200, 100));
    assert_eq!(body.len(), 12 + 200 * 100 * 2);
}

#[tokio::test]
async fn test_max_size_shrinks() {
    let addr = fixture_server().await;
    let (status, _, body) = send(
        app(),
        json_request(serde_json::json!({
            "url": format!("http://{addr}/logo.png"),
            "maxSize": "100x100",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_dims(&body), (100, 50));
}

#[tokio::test]
async fn test_max_size_object_form() {
    let addr = fixture_server().await;
    let (status, _, body) = send(
        app(),
        json_request(serde_json::json!({
            "url": format!("http://{addr}/logo.png"),
            "maxSize": {"width": 50, "height": 50},
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_dims(&body), (50, 25));
}

#[tokio::test]
async fn test_malformed_max_size_is_ignored() {
    let addr = fixture_server().await;
    let (status, _, body) = send(
        app(),
        json_request(serde_json::json!({
            "url": format!("http://{addr}/logo.png"),
            "maxSize": "abcxdef",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_dims(&body), (200, 100));
}

#[tokio::test]
async fn test_png_preview_output() {
    let addr = fixture_server().await;
    let (status, ct, body) = send(
        app(),
        json_request(serde_json::json!({
            "url": format!("http://{addr}/logo.png"),
            "cf": "I4",
            "output": "image",
            "dither": true,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ct, "image/png");
    let img = image::load_from_memory(&body).unwrap();
    assert_eq!((img.width(), img.height()), (200, 100));
}

#[tokio::test]
async fn test_compressed_bin() {
    let addr = fixture_server().await;
    let (status, _, body) = send(
        app(),
        json_request(serde_json::json!({
            "url": format!("http://{addr}/logo.png"),
            "cf": "RGB565",
            "compression": "RLE",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(u16::from_le_bytes([body[2], body[3]]) & 0x0008, 0x0008);
    assert_eq!(&body[12..16], &1u32.to_le_bytes());
}

#[tokio::test]
async fn test_data_url() {
    let data_url = format!("data:image/png;base64,{}", STANDARD.encode(sample_png(8, 4)));
    let (status, _, body) = send(
        app(),
        json_request(serde_json::json!({ "url": data_url, "cf": "A8" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_dims(&body), (8, 4));
    assert_eq!(body.len(), 12 + 8 * 4);
}

// ── /convert failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unreachable_url_is_500() {
    let (status, ct, body) = send(
        app(),
        json_request(serde_json::json!({ "url": "http://127.0.0.1:1/x.png" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ct.starts_with("text/plain"));
    let msg = String::from_utf8(body).unwrap();
    assert!(msg.contains("downloading"), "message: {msg}");
}

#[tokio::test]
async fn test_chunked_download_stops_at_limit() {
    let addr = fixture_server().await;
    let limit = 1024 * 1024;
    let app = router(
        AppState::new(
            ServerConfig::builder()
                .max_upload_bytes(limit)
                .build()
                .unwrap(),
        )
        .unwrap(),
    );
    let (status, _, body) = send(
        app,
        json_request(serde_json::json!({ "url": format!("http://{addr}/huge.png") })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let msg = String::from_utf8(body).unwrap();
    let size: usize = msg
        .strip_prefix("Image is ")
        .and_then(|rest| rest.split(' ').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("unexpected message: {msg}"));
    assert!(size > limit);
    assert!(size <= limit + CHUNK, "read {size} bytes before rejecting");
}

#[tokio::test]
async fn test_missing_resource_is_500() {
    let addr = fixture_server().await;
    let (status, _, body) = send(
        app(),
        json_request(serde_json::json!({ "url": format!("http://{addr}/nope.png") })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("404"));
}

#[tokio::test]
async fn test_non_image_content_type_is_500() {
    let addr = fixture_server().await;
    let (status, _, body) = send(
        app(),
        json_request(serde_json::json!({ "url": format!("http://{addr}/page.html") })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("text/html"));
}

#[tokio::test]
async fn test_no_source_is_500() {
    let (status, _, body) = send(app(), json_request(serde_json::json!({ "cf": "RGB565" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "No image file or URL provided"
    );
}

#[tokio::test]
async fn test_empty_body_is_500() {
    let req = Request::builder()
        .method("POST")
        .uri("/convert")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app(), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unknown_color_format_is_500() {
    let addr = fixture_server().await;
    let (status, _, body) = send(
        app(),
        json_request(serde_json::json!({
            "url": format!("http://{addr}/logo.png"),
            "cf": "RGB999",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("RGB999"));
}

#[tokio::test]
async fn test_unknown_output_is_500() {
    let (status, _, body) = send(
        app(),
        json_request(serde_json::json!({ "url": "http://127.0.0.1:1/x.png", "output": "bmp" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("bmp"));
}

#[tokio::test]
async fn test_invalid_json_is_500() {
    let req = Request::builder()
        .method("POST")
        .uri("/convert")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, _) = send(app(), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// ── /convert with an upload ──────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_with_params_field() {
    let png = sample_png(40, 40);
    let req = multipart_request(&[
        ("image", Some("photo.png"), &png),
        (
            "params",
            None,
            br#"{"cf":"ARGB8888","output":"bin","maxSize":"20x20"}"#,
        ),
    ]);
    let (status, _, body) = send(app(), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_dims(&body), (20, 20));
    assert_eq!(body.len(), 12 + 20 * 20 * 4);
}

#[tokio::test]
async fn test_upload_with_individual_fields() {
    let png = sample_png(10, 6);
    let req = multipart_request(&[
        ("image", Some("icon.PNG"), &png),
        ("cf", None, b"RGB565"),
        ("output", None, b"c_array"),
        ("bigEndian", None, b"true"),
    ]);
    let (status, ct, body) = send(app(), req).await;

    assert_eq!(status, StatusCode::OK);
    assert!(ct.starts_with("text/plain"));
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("LV_COLOR_FORMAT_RGB565_SWAPPED"));
}

#[tokio::test]
async fn test_upload_with_wrong_extension_is_500() {
    let req = multipart_request(&[("image", Some("notes.gif"), b"GIF89a")]);
    let (status, _, body) = send(app(), req).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("Only JPG and PNG"));
}

#[tokio::test]
async fn test_upload_takes_precedence_over_url() {
    let png = sample_png(6, 6);
    let req = multipart_request(&[
        ("image", Some("a.png"), &png),
        ("url", None, b"http://127.0.0.1:1/unreachable.png"),
    ]);
    let (status, _, body) = send(app(), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header_dims(&body), (6, 6));
}

#[tokio::test]
async fn test_upload_of_garbage_is_500() {
    let req = multipart_request(&[("image", Some("broken.png"), b"definitely not a png")]);
    let (status, _, body) = send(app(), req).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("decoding"));
}

// ── Informational routes ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_formats_route() {
    let req = Request::builder()
        .uri("/formats")
        .body(Body::empty())
        .unwrap();
    let (status, ct, body) = send(app(), req).await;

    assert_eq!(status, StatusCode::OK);
    assert!(ct.starts_with("application/json"));
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let formats = v["color_formats"].as_array().unwrap();
    assert!(formats.iter().any(|f| f == "RGB565A8"));
    assert!(v["compression_options"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c == "RLE"));
}

#[tokio::test]
async fn test_index_route() {
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, _, body) = send(app(), req).await;

    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(v["endpoints"]["/convert"].is_string());
}
