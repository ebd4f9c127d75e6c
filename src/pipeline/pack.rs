//! LVGL pixel layout: image header plus packed pixel data.
//!
//! The header is the 12-byte `lv_image_header_t` of LVGL v9, little-endian.
//! Sub-byte formats are packed most-significant-bit first and every row
//! starts on a byte boundary.

use crate::error::Img2LvglError;
use crate::format::ColorFormat;
use crate::pipeline::quantize::Quantized;
use image::Rgba;
use tracing::debug;

/// First byte of every LVGL v9 image header.
pub const IMAGE_HEADER_MAGIC: u8 = 0x19;

/// Header flag: pixel data is compressed.
pub const FLAG_COMPRESSED: u16 = 0x0008;

/// Size of [`ImageHeader::to_bytes`].
pub const HEADER_LEN: usize = 12;

/// The `lv_image_header_t` written before the pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub format: ColorFormat,
    pub flags: u16,
    pub width: u16,
    pub height: u16,
    pub stride: u16,
}

impl ImageHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = IMAGE_HEADER_MAGIC;
        out[1] = self.format.id();
        out[2..4].copy_from_slice(&self.flags.to_le_bytes());
        out[4..6].copy_from_slice(&self.width.to_le_bytes());
        out[6..8].copy_from_slice(&self.height.to_le_bytes());
        out[8..10].copy_from_slice(&self.stride.to_le_bytes());
        // out[10..12]: reserved
        out
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Header plus uncompressed pixel data.
#[derive(Debug, Clone)]
pub struct PackedImage {
    pub header: ImageHeader,
    pub data: Vec<u8>,
}

/// Bytes per row for `width` pixels of `format`.
pub fn stride(format: ColorFormat, width: u32) -> u32 {
    (width * format.bpp()).div_ceil(8)
}

fn dimensions(width: u32, height: u32) -> Result<(u16, u16), Img2LvglError> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(Img2LvglError::DimensionsTooLarge { width, height }),
    }
}

/// Pack a quantized image into LVGL's layout for its format.
///
/// `swap` byte-swaps RGB565 words; for plain RGB565 this switches the
/// format to RGB565_SWAPPED.
pub fn pack(q: &Quantized, swap: bool) -> Result<PackedImage, Img2LvglError> {
    let (w, h) = dimensions(q.width(), q.height())?;

    let mut format = q.format;
    let mut swap_words = format == ColorFormat::Rgb565Swapped;
    if swap {
        match format {
            ColorFormat::Rgb565 => {
                format = ColorFormat::Rgb565Swapped;
                swap_words = true;
            }
            ColorFormat::Argb8565 | ColorFormat::Rgb565A8 => swap_words = true,
            ColorFormat::Rgb565Swapped => {}
            other => debug!("Byte swap has no effect on {}", other),
        }
    }

    let row_bytes = stride(format, q.width()) as usize;
    let mut data = Vec::with_capacity(row_bytes * h as usize + format.palette_len() * 4);

    if format.is_indexed() {
        for c in &q.palette {
            data.extend_from_slice(&bgra(*c));
        }
        pack_bits(&mut data, q, format.bpp(), |x, y| {
            q.indices[(y * q.width() + x) as usize]
        });
    } else if format.is_alpha_only() {
        let shift = 8 - format.bpp();
        pack_bits(&mut data, q, format.bpp(), |x, y| q.pixels.get_pixel(x, y)[3] >> shift);
    } else {
        for row in q.pixels.rows() {
            for p in row {
                push_pixel(&mut data, format, *p, swap_words);
            }
        }
        if format == ColorFormat::Rgb565A8 {
            for p in q.pixels.pixels() {
                data.push(p[3]);
            }
        }
    }

    Ok(PackedImage {
        header: ImageHeader {
            format,
            flags: 0,
            width: w,
            height: h,
            stride: row_bytes as u16,
        },
        data,
    })
}

/// Header and data for RAW formats: the encoded file, untouched.
pub fn pack_raw(
    format: ColorFormat,
    bytes: &[u8],
    dims: Option<(u32, u32)>,
) -> Result<PackedImage, Img2LvglError> {
    let (w, h) = match dims {
        Some((w, h)) => dimensions(w, h)?,
        None => (0, 0),
    };
    Ok(PackedImage {
        header: ImageHeader {
            format,
            flags: 0,
            width: w,
            height: h,
            stride: 0,
        },
        data: bytes.to_vec(),
    })
}

fn rgb565(p: Rgba<u8>) -> u16 {
    ((p[0] as u16 >> 3) << 11) | ((p[1] as u16 >> 2) << 5) | (p[2] as u16 >> 3)
}

fn bgra(p: Rgba<u8>) -> [u8; 4] {
    [p[2], p[1], p[0], p[3]]
}

fn push_pixel(out: &mut Vec<u8>, format: ColorFormat, p: Rgba<u8>, swap: bool) {
    let word = |v: u16| if swap { v.to_be_bytes() } else { v.to_le_bytes() };
    match format {
        ColorFormat::Rgb565 | ColorFormat::Rgb565Swapped | ColorFormat::Rgb565A8 => {
            out.extend_from_slice(&word(rgb565(p)))
        }
        ColorFormat::Argb8565 => {
            out.extend_from_slice(&word(rgb565(p)));
            out.push(p[3]);
        }
        ColorFormat::Rgb888 => out.extend_from_slice(&[p[2], p[1], p[0]]),
        ColorFormat::Argb8888 => out.extend_from_slice(&bgra(p)),
        ColorFormat::Xrgb8888 => out.extend_from_slice(&[p[2], p[1], p[0], 0xFF]),
        ColorFormat::L8 => out.push(p[0]),
        ColorFormat::Al88 => out.extend_from_slice(&[p[0], p[3]]),
        // Handled by the callers.
        ColorFormat::Raw
        | ColorFormat::RawAlpha
        | ColorFormat::I1
        | ColorFormat::I2
        | ColorFormat::I4
        | ColorFormat::I8
        | ColorFormat::A1
        | ColorFormat::A2
        | ColorFormat::A4
        | ColorFormat::A8 => {}
    }
}

/// Pack `bpp`-bit values row by row, MSB first, rows byte-aligned.
fn pack_bits(out: &mut Vec<u8>, q: &Quantized, bpp: u32, value: impl Fn(u32, u32) -> u8) {
    let per_byte = 8 / bpp;
    for y in 0..q.height() {
        let mut byte = 0u8;
        let mut filled = 0;
        for x in 0..q.width() {
            byte |= value(x, y) << (8 - bpp * (filled + 1));
            filled += 1;
            if filled == per_byte {
                out.push(byte);
                byte = 0;
                filled = 0;
            }
        }
        if filled > 0 {
            out.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::quantize::quantize;
    use image::{DynamicImage, RgbaImage};

    fn quantized(img: RgbaImage, format: ColorFormat) -> Quantized {
        quantize(&DynamicImage::ImageRgba8(img), format, false)
    }

    #[test]
    fn header_layout() {
        let h = ImageHeader {
            format: ColorFormat::Rgb565,
            flags: FLAG_COMPRESSED,
            width: 0x0102,
            height: 0x0304,
            stride: 0x0204,
        };
        assert_eq!(
            h.to_bytes(),
            [0x19, 0x12, 0x08, 0x00, 0x02, 0x01, 0x04, 0x03, 0x04, 0x02, 0, 0]
        );
        assert!(h.is_compressed());
    }

    #[test]
    fn strides() {
        assert_eq!(stride(ColorFormat::I1, 9), 2);
        assert_eq!(stride(ColorFormat::A4, 3), 2);
        assert_eq!(stride(ColorFormat::Rgb565, 10), 20);
        assert_eq!(stride(ColorFormat::Argb8565, 10), 30);
        assert_eq!(stride(ColorFormat::Rgb565A8, 10), 20);
        assert_eq!(stride(ColorFormat::Xrgb8888, 3), 12);
    }

    #[test]
    fn rgb565_little_endian_and_swapped() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0xFF, 0x00, 0x00, 0xFF]));
        let q = quantized(img, ColorFormat::Rgb565);

        let p = pack(&q, false).unwrap();
        assert_eq!(p.header.format, ColorFormat::Rgb565);
        assert_eq!(p.data, vec![0x00, 0xF8]);

        let p = pack(&q, true).unwrap();
        assert_eq!(p.header.format, ColorFormat::Rgb565Swapped);
        assert_eq!(p.data, vec![0xF8, 0x00]);
    }

    #[test]
    fn swap_flips_words_of_alpha_565_formats() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0xFF, 0x00, 0x00, 0x80]));
        let p = pack(&quantized(img, ColorFormat::Argb8565), true).unwrap();
        assert_eq!(p.header.format, ColorFormat::Argb8565);
        assert_eq!(p.data, vec![0xF8, 0x00, 0x80]);

        let img = RgbaImage::from_pixel(2, 1, Rgba([0, 0xFF, 0, 0x40]));
        let p = pack(&quantized(img, ColorFormat::Rgb565A8), true).unwrap();
        assert_eq!(p.header.format, ColorFormat::Rgb565A8);
        assert_eq!(p.data, vec![0x07, 0xE0, 0x07, 0xE0, 0x40, 0x40]);
    }

    #[test]
    fn rgb565a8_has_alpha_plane() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([0, 0xFF, 0, 0x40]));
        let p = pack(&quantized(img, ColorFormat::Rgb565A8), false).unwrap();
        assert_eq!(p.header.stride, 4);
        assert_eq!(p.data, vec![0xE0, 0x07, 0xE0, 0x07, 0x40, 0x40]);
    }

    #[test]
    fn argb8888_is_bgra() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let p = pack(&quantized(img, ColorFormat::Argb8888), false).unwrap();
        assert_eq!(p.data, vec![3, 2, 1, 4]);

        let img = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let p = pack(&quantized(img, ColorFormat::Xrgb8888), false).unwrap();
        assert_eq!(p.data, vec![3, 2, 1, 0xFF]);
    }

    #[test]
    fn indexed_palette_then_msb_first_bits() {
        let mut img = RgbaImage::from_pixel(9, 1, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        img.put_pixel(8, 0, Rgba([0, 0, 255, 255]));
        let p = pack(&quantized(img, ColorFormat::I1), false).unwrap();

        assert_eq!(p.header.stride, 2);
        assert_eq!(&p.data[..8], &[0, 0, 255, 255, 255, 0, 0, 255]);
        assert_eq!(&p.data[8..], &[0b0100_0000, 0b1000_0000]);
    }

    #[test]
    fn alpha_only_packing() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 0xFF]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0x00]));
        let p = pack(&quantized(img, ColorFormat::A4), false).unwrap();
        assert_eq!(p.header.stride, 2);
        assert_eq!(p.data, vec![0xF0, 0xF0, 0xFF, 0xF0]);
    }

    #[test]
    fn raw_keeps_bytes() {
        let p = pack_raw(ColorFormat::Raw, b"\x89PNG....", Some((4, 2))).unwrap();
        assert_eq!(p.data, b"\x89PNG....");
        assert_eq!((p.header.width, p.header.height, p.header.stride), (4, 2, 0));
    }

    #[test]
    fn oversized_dimensions_rejected() {
        assert!(matches!(
            pack_raw(ColorFormat::Raw, b"", Some((70000, 1))),
            Err(Img2LvglError::DimensionsTooLarge { .. })
        ));
    }
}
