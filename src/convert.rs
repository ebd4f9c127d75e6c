//! Conversion entry points.
//!
//! [`convert`] is the whole conversion in one synchronous call: decode,
//! resize, quantize, pack and encode. It is CPU-bound, so async callers go
//! through [`convert_blocking`], which moves it onto tokio's blocking pool.

use crate::config::ConversionOptions;
use crate::error::Img2LvglError;
use crate::format::{ColorFormat, OutputMode};
use crate::output::{ConversionOutput, ConversionStats, OutputBody};
use crate::pipeline::{emit, input, pack, quantize, resize};
use std::io::Cursor;
use std::time::Instant;
use tracing::{debug, info};

/// Convert an encoded PNG/JPEG image to the requested LVGL output.
///
/// # Errors
/// - [`Img2LvglError::Decode`] when the bytes are not a decodable image
/// - [`Img2LvglError::DimensionsTooLarge`] when a side exceeds 65535 px
/// - [`Img2LvglError::Encode`] when the PNG preview cannot be written
pub fn convert(
    bytes: &[u8],
    options: &ConversionOptions,
) -> Result<ConversionOutput, Img2LvglError> {
    let start = Instant::now();
    let (format, implied_swap) = options.format.resolve(options.output.binary_format());
    let swap = options.big_endian || implied_swap;
    info!(
        "Converting {} bytes → {} ({:?}, compression {})",
        bytes.len(),
        format,
        options.output,
        options.compression.name()
    );

    if format.is_raw() {
        return convert_raw(bytes, format, options, start);
    }

    // ── Step 1: Decode ───────────────────────────────────────────────────
    let img = image::load_from_memory(bytes).map_err(Img2LvglError::Decode)?;
    debug!("Decoded {}x{} image", img.width(), img.height());

    // ── Step 2: Resize ───────────────────────────────────────────────────
    let img = resize::apply_max_size(img, options.max_size);

    // ── Step 3: Quantize ─────────────────────────────────────────────────
    let quantized = quantize::quantize(&img, format, options.dither);

    // ── Step 4: Pack and encode ──────────────────────────────────────────
    let (body, written) = match options.output {
        OutputMode::Image => (
            OutputBody::Binary(emit::to_png(&quantized.pixels)?),
            format,
        ),
        OutputMode::Binary(_) => {
            let packed = pack::pack(&quantized, swap)?;
            (
                OutputBody::Binary(emit::to_bin(&packed, options.compression)),
                packed.header.format,
            )
        }
        OutputMode::CArray => {
            let packed = pack::pack(&quantized, swap)?;
            (
                OutputBody::Text(emit::to_c_array(
                    &packed,
                    options.compression,
                    &options.array_name,
                )),
                packed.header.format,
            )
        }
    };

    let stats = ConversionStats {
        format: written,
        width: quantized.width(),
        height: quantized.height(),
        input_bytes: bytes.len(),
        output_bytes: body.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Converted to {} {}x{}: {} bytes in {}ms",
        stats.format, stats.width, stats.height, stats.output_bytes, stats.duration_ms
    );

    Ok(ConversionOutput {
        body,
        content_type: options.output.content_type(),
        filename: format!("output.{}", options.output.extension()),
        stats,
    })
}

/// RAW formats embed the encoded file untouched; nothing is decoded.
fn convert_raw(
    bytes: &[u8],
    format: ColorFormat,
    options: &ConversionOptions,
    start: Instant,
) -> Result<ConversionOutput, Img2LvglError> {
    let dims = header_dimensions(bytes);
    if options.max_size.is_some() {
        debug!("maxSize ignored for {}", format);
    }

    let (body, content_type, filename) = match options.output {
        OutputMode::Image => {
            let mime = input::sniff_mime(bytes);
            let ext = match mime {
                Some("image/jpeg") => "jpg",
                Some(_) => "png",
                None => "bin",
            };
            (
                OutputBody::Binary(bytes.to_vec()),
                mime.unwrap_or("application/octet-stream"),
                format!("output.{ext}"),
            )
        }
        OutputMode::Binary(_) => {
            let packed = pack::pack_raw(format, bytes, dims)?;
            (
                OutputBody::Binary(emit::to_bin(&packed, options.compression)),
                options.output.content_type(),
                "output.bin".to_string(),
            )
        }
        OutputMode::CArray => {
            let packed = pack::pack_raw(format, bytes, dims)?;
            (
                OutputBody::Text(emit::to_c_array(
                    &packed,
                    options.compression,
                    &options.array_name,
                )),
                options.output.content_type(),
                "output.c".to_string(),
            )
        }
    };

    let (width, height) = dims.unwrap_or((0, 0));
    let stats = ConversionStats {
        format,
        width,
        height,
        input_bytes: bytes.len(),
        output_bytes: body.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Embedded {} bytes as {} ({}x{})",
        bytes.len(),
        format,
        width,
        height
    );

    Ok(ConversionOutput {
        body,
        content_type,
        filename,
        stats,
    })
}

/// Image dimensions from the file header, without decoding pixels.
fn header_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Run [`convert`] on the blocking thread pool.
pub async fn convert_blocking(
    bytes: Vec<u8>,
    options: ConversionOptions,
) -> Result<ConversionOutput, Img2LvglError> {
    tokio::task::spawn_blocking(move || convert(&bytes, &options))
        .await
        .map_err(|e| Img2LvglError::Internal(format!("Conversion task panicked: {}", e)))?
}
