//! Closed parameter sets: color formats, output modes and compression.
//!
//! Every string a request may carry is parsed into one of these enums at the
//! request boundary. Anything outside the set is rejected with a validation
//! error instead of being forwarded to the encoder.

use crate::error::Img2LvglError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ── ColorFormat ──────────────────────────────────────────────────────────

/// Concrete LVGL pixel formats, with the ids LVGL stores in image headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorFormat {
    /// Encoded image file (PNG/JPEG) embedded verbatim.
    Raw,
    /// As [`ColorFormat::Raw`], flagged as carrying transparency.
    RawAlpha,
    L8,
    I1,
    I2,
    I4,
    I8,
    A1,
    A2,
    A4,
    A8,
    Al88,
    Rgb565,
    Rgb565Swapped,
    Argb8565,
    Rgb565A8,
    Rgb888,
    Argb8888,
    Xrgb8888,
}

impl ColorFormat {
    /// All formats, in the order `/formats` lists them.
    pub const ALL: [ColorFormat; 19] = [
        ColorFormat::Raw,
        ColorFormat::RawAlpha,
        ColorFormat::L8,
        ColorFormat::I1,
        ColorFormat::I2,
        ColorFormat::I4,
        ColorFormat::I8,
        ColorFormat::A1,
        ColorFormat::A2,
        ColorFormat::A4,
        ColorFormat::A8,
        ColorFormat::Al88,
        ColorFormat::Rgb565,
        ColorFormat::Rgb565Swapped,
        ColorFormat::Argb8565,
        ColorFormat::Rgb565A8,
        ColorFormat::Rgb888,
        ColorFormat::Argb8888,
        ColorFormat::Xrgb8888,
    ];

    /// Upper-case LVGL name, as used in `LV_COLOR_FORMAT_<name>`.
    pub fn name(self) -> &'static str {
        match self {
            ColorFormat::Raw => "RAW",
            ColorFormat::RawAlpha => "RAW_ALPHA",
            ColorFormat::L8 => "L8",
            ColorFormat::I1 => "I1",
            ColorFormat::I2 => "I2",
            ColorFormat::I4 => "I4",
            ColorFormat::I8 => "I8",
            ColorFormat::A1 => "A1",
            ColorFormat::A2 => "A2",
            ColorFormat::A4 => "A4",
            ColorFormat::A8 => "A8",
            ColorFormat::Al88 => "AL88",
            ColorFormat::Rgb565 => "RGB565",
            ColorFormat::Rgb565Swapped => "RGB565_SWAPPED",
            ColorFormat::Argb8565 => "ARGB8565",
            ColorFormat::Rgb565A8 => "RGB565A8",
            ColorFormat::Rgb888 => "RGB888",
            ColorFormat::Argb8888 => "ARGB8888",
            ColorFormat::Xrgb8888 => "XRGB8888",
        }
    }

    /// The `cf` byte of the LVGL image header.
    pub fn id(self) -> u8 {
        match self {
            ColorFormat::Raw => 0x01,
            ColorFormat::RawAlpha => 0x02,
            ColorFormat::L8 => 0x06,
            ColorFormat::I1 => 0x07,
            ColorFormat::I2 => 0x08,
            ColorFormat::I4 => 0x09,
            ColorFormat::I8 => 0x0A,
            ColorFormat::A1 => 0x0B,
            ColorFormat::A2 => 0x0C,
            ColorFormat::A4 => 0x0D,
            ColorFormat::A8 => 0x0E,
            ColorFormat::Rgb888 => 0x0F,
            ColorFormat::Argb8888 => 0x10,
            ColorFormat::Xrgb8888 => 0x11,
            ColorFormat::Rgb565 => 0x12,
            ColorFormat::Argb8565 => 0x13,
            ColorFormat::Rgb565A8 => 0x14,
            ColorFormat::Al88 => 0x15,
            ColorFormat::Rgb565Swapped => 0x1B,
        }
    }

    /// Bits per pixel of the primary plane. RAW formats report 0.
    ///
    /// RGB565A8 reports 16: the alpha plane follows the color plane and is
    /// not part of the stride.
    pub fn bpp(self) -> u32 {
        match self {
            ColorFormat::Raw | ColorFormat::RawAlpha => 0,
            ColorFormat::I1 | ColorFormat::A1 => 1,
            ColorFormat::I2 | ColorFormat::A2 => 2,
            ColorFormat::I4 | ColorFormat::A4 => 4,
            ColorFormat::L8 | ColorFormat::I8 | ColorFormat::A8 => 8,
            ColorFormat::Al88
            | ColorFormat::Rgb565
            | ColorFormat::Rgb565Swapped
            | ColorFormat::Rgb565A8 => 16,
            ColorFormat::Argb8565 | ColorFormat::Rgb888 => 24,
            ColorFormat::Argb8888 | ColorFormat::Xrgb8888 => 32,
        }
    }

    pub fn is_raw(self) -> bool {
        matches!(self, ColorFormat::Raw | ColorFormat::RawAlpha)
    }

    pub fn is_indexed(self) -> bool {
        matches!(
            self,
            ColorFormat::I1 | ColorFormat::I2 | ColorFormat::I4 | ColorFormat::I8
        )
    }

    pub fn is_alpha_only(self) -> bool {
        matches!(
            self,
            ColorFormat::A1 | ColorFormat::A2 | ColorFormat::A4 | ColorFormat::A8
        )
    }

    /// Formats whose color channels are stored as RGB565 words.
    pub fn is_rgb565_family(self) -> bool {
        matches!(
            self,
            ColorFormat::Rgb565
                | ColorFormat::Rgb565Swapped
                | ColorFormat::Argb8565
                | ColorFormat::Rgb565A8
        )
    }

    /// Number of palette entries for indexed formats, 0 otherwise.
    pub fn palette_len(self) -> usize {
        if self.is_indexed() {
            1 << self.bpp()
        } else {
            0
        }
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── RequestedFormat ──────────────────────────────────────────────────────

/// The color format a request names.
///
/// Besides every concrete [`ColorFormat`], requests may use the legacy
/// `CF_*` names. `CF_TRUE_COLOR` and `CF_TRUE_COLOR_ALPHA` do not fix a
/// byte layout; the binary sub-format of the output picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedFormat {
    Exact(ColorFormat),
    TrueColor,
    TrueColorAlpha,
}

impl RequestedFormat {
    /// Legacy `CF_*` names accepted alongside [`ColorFormat::name`].
    pub const LEGACY_NAMES: [&'static str; 13] = [
        "CF_TRUE_COLOR",
        "CF_TRUE_COLOR_ALPHA",
        "CF_RAW",
        "CF_RAW_ALPHA",
        "CF_INDEXED",
        "CF_INDEXED_1_BIT",
        "CF_INDEXED_2_BIT",
        "CF_INDEXED_4_BIT",
        "CF_INDEXED_8_BIT",
        "CF_ALPHA_1_BIT",
        "CF_ALPHA_2_BIT",
        "CF_ALPHA_4_BIT",
        "CF_ALPHA_8_BIT",
    ];

    /// Pick the concrete format, returning it with the swap flag the
    /// sub-format implies.
    pub fn resolve(self, binary: BinaryFormat) -> (ColorFormat, bool) {
        match (self, binary) {
            (RequestedFormat::Exact(cf), _) => (cf, false),
            (RequestedFormat::TrueColor, BinaryFormat::Native | BinaryFormat::Rgb565) => {
                (ColorFormat::Rgb565, false)
            }
            (RequestedFormat::TrueColor, BinaryFormat::Rgb565Swap) => {
                (ColorFormat::Rgb565Swapped, false)
            }
            (RequestedFormat::TrueColor, BinaryFormat::Rgb888) => (ColorFormat::Xrgb8888, false),
            (RequestedFormat::TrueColorAlpha, BinaryFormat::Native | BinaryFormat::Rgb565) => {
                (ColorFormat::Argb8565, false)
            }
            (RequestedFormat::TrueColorAlpha, BinaryFormat::Rgb565Swap) => {
                (ColorFormat::Argb8565, true)
            }
            (RequestedFormat::TrueColorAlpha, BinaryFormat::Rgb888) => {
                (ColorFormat::Argb8888, false)
            }
        }
    }
}

impl FromStr for RequestedFormat {
    type Err = Img2LvglError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();

        if let Some(cf) = ColorFormat::ALL.iter().find(|cf| cf.name() == upper) {
            return Ok(RequestedFormat::Exact(*cf));
        }

        let legacy = match upper.as_str() {
            "CF_TRUE_COLOR" => return Ok(RequestedFormat::TrueColor),
            "CF_TRUE_COLOR_ALPHA" => return Ok(RequestedFormat::TrueColorAlpha),
            "CF_RAW" => ColorFormat::Raw,
            "CF_RAW_ALPHA" => ColorFormat::RawAlpha,
            "CF_INDEXED_1_BIT" => ColorFormat::I1,
            "CF_INDEXED_2_BIT" => ColorFormat::I2,
            "CF_INDEXED_4_BIT" => ColorFormat::I4,
            "CF_INDEXED_8_BIT" | "CF_INDEXED" => ColorFormat::I8,
            "CF_ALPHA_1_BIT" => ColorFormat::A1,
            "CF_ALPHA_2_BIT" => ColorFormat::A2,
            "CF_ALPHA_4_BIT" => ColorFormat::A4,
            "CF_ALPHA_8_BIT" => ColorFormat::A8,
            _ => return Err(Img2LvglError::UnknownColorFormat(s.to_string())),
        };
        Ok(RequestedFormat::Exact(legacy))
    }
}

// ── OutputMode ───────────────────────────────────────────────────────────

/// Byte packing for true-color requests in binary mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryFormat {
    /// Plain `bin`: the format's own layout (RGB565 for true color).
    #[default]
    Native,
    Rgb565,
    Rgb565Swap,
    Rgb888,
}

/// Overall response encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// LVGL `.bin` file.
    Binary(BinaryFormat),
    /// C source defining an `lv_image_dsc_t`.
    CArray,
    /// PNG preview of what the device will display.
    Image,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Binary(BinaryFormat::Native)
    }
}

impl OutputMode {
    /// Accepted `output` values, in the order `/formats` lists them.
    pub const NAMES: [&'static str; 7] = [
        "bin",
        "bin_565",
        "bin_565_swap",
        "bin_888",
        "c_array",
        "image",
        "png",
    ];

    pub fn binary_format(self) -> BinaryFormat {
        match self {
            OutputMode::Binary(b) => b,
            _ => BinaryFormat::Native,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputMode::Binary(_) => "application/octet-stream",
            OutputMode::CArray => "text/plain; charset=utf-8",
            OutputMode::Image => "image/png",
        }
    }

    /// File extension used in `Content-Disposition`.
    pub fn extension(self) -> &'static str {
        match self {
            OutputMode::Binary(_) => "bin",
            OutputMode::CArray => "c",
            OutputMode::Image => "png",
        }
    }
}

impl FromStr for OutputMode {
    type Err = Img2LvglError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bin" | "bin_file" => Ok(OutputMode::Binary(BinaryFormat::Native)),
            "bin_565" => Ok(OutputMode::Binary(BinaryFormat::Rgb565)),
            "bin_565_swap" => Ok(OutputMode::Binary(BinaryFormat::Rgb565Swap)),
            "bin_888" => Ok(OutputMode::Binary(BinaryFormat::Rgb888)),
            "c_array" => Ok(OutputMode::CArray),
            "image" | "png" => Ok(OutputMode::Image),
            _ => Err(Img2LvglError::UnknownOutput(s.to_string())),
        }
    }
}

// ── Compression ──────────────────────────────────────────────────────────

/// Compression applied to the pixel data of binary and C-array outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Compression {
    #[default]
    None,
    Rle,
    Lz4,
}

impl Compression {
    pub const ALL: [Compression; 3] = [Compression::None, Compression::Rle, Compression::Lz4];

    pub fn name(self) -> &'static str {
        match self {
            Compression::None => "NONE",
            Compression::Rle => "RLE",
            Compression::Lz4 => "LZ4",
        }
    }

    /// Method id written in front of compressed payloads.
    pub fn method_id(self) -> u32 {
        match self {
            Compression::None => 0,
            Compression::Rle => 1,
            Compression::Lz4 => 2,
        }
    }
}

impl FromStr for Compression {
    type Err = Img2LvglError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" | "" => Ok(Compression::None),
            "RLE" => Ok(Compression::Rle),
            "LZ4" => Ok(Compression::Lz4),
            _ => Err(Img2LvglError::UnknownCompression(s.to_string())),
        }
    }
}
