//! # img2lvgl
//!
//! Convert PNG and JPEG images into LVGL image data over HTTP.
//!
//! LVGL draws images from a packed pixel buffer described by a small
//! header: color format, dimensions and stride. This crate produces that
//! buffer either as a `.bin` file for the filesystem, as C source defining
//! an `lv_image_dsc_t` to compile into firmware, or as a PNG preview of what
//! the display will show after color reduction.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request
//!  │
//!  ├─ 1. Params    JSON body / multipart fields → ConversionOptions
//!  ├─ 2. Input     upload, http(s) download or data: URL → bytes
//!  ├─ 3. Resize    shrink into maxSize (aspect ratio kept)
//!  ├─ 4. Quantize  per-format precision, dithering, palettes
//!  ├─ 5. Pack      LVGL layout + 12-byte header, optional RLE/LZ4
//!  └─ 6. Emit      .bin, C array or PNG
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use img2lvgl::{convert, ConversionOptions, OutputMode};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let png = std::fs::read("logo.png")?;
//!     let options = ConversionOptions::builder()
//!         .color_format("RGB565A8")?
//!         .output(OutputMode::CArray)
//!         .array_name("logo")
//!         .build()?;
//!     let output = convert(&png, &options)?;
//!     std::fs::write(&output.filename, output.body.into_bytes())?;
//!     Ok(())
//! }
//! ```
//!
//! Running the service:
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), img2lvgl::Img2LvglError> {
//!     img2lvgl::serve(img2lvgl::ServerConfig::default()).await
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2lvgl` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod request;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionOptions, ConversionOptionsBuilder, MaxSize, ServerConfig, ServerConfigBuilder,
};
pub use convert::{convert, convert_blocking};
pub use error::{ErrorKind, Img2LvglError};
pub use format::{BinaryFormat, ColorFormat, Compression, OutputMode, RequestedFormat};
pub use output::{ConversionOutput, ConversionStats, OutputBody};
pub use request::ConvertParams;
pub use server::{router, serve, AppState};
