//! Color reduction: bring decoded pixels down to a format's precision.
//!
//! The output keeps two views of the result:
//!
//! * `pixels`, an RGBA image whose channels already carry only the bits the
//!   format stores (expanded back to 8 bits), which is exactly what the
//!   device will show and what the PNG preview encodes;
//! * for indexed formats, the palette and one index per pixel.
//!
//! [`crate::pipeline::pack`] reads the reduced channels back with plain
//! shifts, so packing never has to round again.

use crate::format::ColorFormat;
use color_quant::NeuQuant;
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::HashMap;
use tracing::debug;

/// NeuQuant sampling factor for large images (1 = every pixel, 30 = fastest).
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// Below this many pixels NeuQuant samples every pixel.
const FULL_SAMPLE_PIXELS: usize = 1 << 16;

/// A color-reduced image ready for packing.
#[derive(Debug, Clone)]
pub struct Quantized {
    pub format: ColorFormat,
    /// Display-equivalent pixels.
    pub pixels: RgbaImage,
    /// Palette for indexed formats; `format.palette_len()` entries.
    pub palette: Vec<Rgba<u8>>,
    /// One palette index per pixel, row-major; empty for non-indexed formats.
    pub indices: Vec<u8>,
}

impl Quantized {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Expand a `bits`-wide value to 8 bits so that `expand(v) >> (8 - bits) == v`.
pub fn expand(v: u8, bits: u32) -> u8 {
    if bits >= 8 {
        return v;
    }
    let max = (1u32 << bits) - 1;
    ((v as u32 * 255 + max / 2) / max) as u8
}

/// Truncate an 8-bit channel to `bits` and expand it back.
fn reduce(v: u8, bits: u32) -> u8 {
    expand(v >> (8 - bits), bits)
}

/// Reduce `img` to `format`. `dither` only affects the RGB565 family.
pub fn quantize(img: &DynamicImage, format: ColorFormat, dither: bool) -> Quantized {
    let rgba = img.to_rgba8();

    if dither && !format.is_rgb565_family() {
        debug!("Dithering ignored for {}", format);
    }

    let (pixels, palette, indices) = match format {
        ColorFormat::Rgb565 | ColorFormat::Rgb565Swapped => {
            (to_rgb565(rgba, dither, false), vec![], vec![])
        }
        ColorFormat::Argb8565 | ColorFormat::Rgb565A8 => {
            (to_rgb565(rgba, dither, true), vec![], vec![])
        }
        ColorFormat::I1 | ColorFormat::I2 | ColorFormat::I4 | ColorFormat::I8 => {
            let (palette, indices) = build_palette(&rgba, format.palette_len());
            let pixels = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                palette[indices[(y * rgba.width() + x) as usize] as usize]
            });
            (pixels, palette, indices)
        }
        ColorFormat::A1 | ColorFormat::A2 | ColorFormat::A4 | ColorFormat::A8 => {
            let bits = format.bpp();
            let pixels = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                Rgba([0, 0, 0, reduce(rgba.get_pixel(x, y)[3], bits)])
            });
            (pixels, vec![], vec![])
        }
        ColorFormat::L8 | ColorFormat::Al88 => {
            let keep_alpha = format == ColorFormat::Al88;
            let luma = img.to_luma_alpha8();
            let pixels = RgbaImage::from_fn(luma.width(), luma.height(), |x, y| {
                let [l, a] = luma.get_pixel(x, y).0;
                Rgba([l, l, l, if keep_alpha { a } else { 255 }])
            });
            (pixels, vec![], vec![])
        }
        ColorFormat::Rgb888 | ColorFormat::Xrgb8888 => {
            let mut pixels = rgba;
            for p in pixels.pixels_mut() {
                p[3] = 255;
            }
            (pixels, vec![], vec![])
        }
        ColorFormat::Argb8888 | ColorFormat::Raw | ColorFormat::RawAlpha => (rgba, vec![], vec![]),
    };

    Quantized {
        format,
        pixels,
        palette,
        indices,
    }
}

// ── RGB565 ───────────────────────────────────────────────────────────────

const RGB565_BITS: [u32; 3] = [5, 6, 5];

/// Reduce color channels to 5/6/5 bits, optionally with Floyd–Steinberg
/// error diffusion. Alpha is kept at 8 bits or forced opaque.
fn to_rgb565(mut img: RgbaImage, dither: bool, keep_alpha: bool) -> RgbaImage {
    let (w, h) = (img.width() as usize, img.height() as usize);

    if !dither {
        for p in img.pixels_mut() {
            for c in 0..3 {
                p[c] = reduce(p[c], RGB565_BITS[c]);
            }
            if !keep_alpha {
                p[3] = 255;
            }
        }
        return img;
    }

    // Error rows for the current and next scanline, 3 channels each.
    let mut cur = vec![0f32; w * 3];
    let mut next = vec![0f32; w * 3];

    for y in 0..h {
        for x in 0..w {
            let p = img.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                let bits = RGB565_BITS[c];
                let max = ((1u32 << bits) - 1) as f32;
                let wanted = (p[c] as f32 + cur[x * 3 + c]).clamp(0.0, 255.0);
                let level = (wanted * max / 255.0).round() as u8;
                let shown = expand(level, bits);
                p[c] = shown;

                let err = wanted - shown as f32;
                if x + 1 < w {
                    cur[(x + 1) * 3 + c] += err * 7.0 / 16.0;
                }
                if y + 1 < h {
                    if x > 0 {
                        next[(x - 1) * 3 + c] += err * 3.0 / 16.0;
                    }
                    next[x * 3 + c] += err * 5.0 / 16.0;
                    if x + 1 < w {
                        next[(x + 1) * 3 + c] += err / 16.0;
                    }
                }
            }
            if !keep_alpha {
                p[3] = 255;
            }
        }
        std::mem::swap(&mut cur, &mut next);
        next.iter_mut().for_each(|e| *e = 0.0);
    }

    img
}

// ── Palette ──────────────────────────────────────────────────────────────

/// Build a palette of `size` entries and map every pixel onto it.
///
/// Images with at most `size` distinct colors get an exact palette in
/// first-seen order; others go through NeuQuant.
fn build_palette(img: &RgbaImage, size: usize) -> (Vec<Rgba<u8>>, Vec<u8>) {
    let mut seen: HashMap<[u8; 4], u8> = HashMap::new();
    let mut palette: Vec<Rgba<u8>> = Vec::with_capacity(size);
    let mut exact = true;

    for p in img.pixels() {
        if !seen.contains_key(&p.0) {
            if palette.len() == size {
                exact = false;
                break;
            }
            seen.insert(p.0, palette.len() as u8);
            palette.push(*p);
        }
    }

    if exact {
        debug!("Exact palette with {} colors", palette.len());
        let indices = img.pixels().map(|p| seen[&p.0]).collect();
        palette.resize(size, Rgba([0, 0, 0, 0]));
        return (palette, indices);
    }

    let pixel_count = (img.width() * img.height()) as usize;
    let sample = if pixel_count < FULL_SAMPLE_PIXELS {
        1
    } else {
        NEUQUANT_SAMPLE_FACTOR
    };
    debug!(
        "NeuQuant palette: {} colors from {} px (sample factor {})",
        size, pixel_count, sample
    );

    let nq = NeuQuant::new(sample, size, img.as_raw());
    let mut palette: Vec<Rgba<u8>> = nq
        .color_map_rgba()
        .chunks_exact(4)
        .map(|c| Rgba([c[0], c[1], c[2], c[3]]))
        .collect();
    palette.resize(size, Rgba([0, 0, 0, 0]));

    let indices = img.pixels().map(|p| nq.index_of(&p.0) as u8).collect();
    (palette, indices)
}
