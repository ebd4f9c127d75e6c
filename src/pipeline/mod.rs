//! Pipeline stages for image-to-LVGL conversion.
//!
//! Each submodule implements exactly one transformation step and is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ resize ──▶ quantize ──▶ pack ──▶ compress ──▶ emit
//! (URL/upload) (cap)   (bit depth)  (layout)  (RLE/LZ4)   (bin/C/PNG)
//! ```
//!
//! 1. [`input`]:    fetch a URL, decode a data URL or validate an upload;
//!    the only stage with network I/O
//! 2. [`resize`]:   shrink into `maxSize`, preserving aspect ratio
//! 3. [`quantize`]: reduce channels to the format's precision, dither,
//!    build palettes
//! 4. [`pack`]:     lay pixels out as LVGL expects and build the header
//! 5. [`compress`]: optional RLE or LZ4 of the pixel data
//! 6. [`emit`]:     binary file, C source array or PNG preview

pub mod compress;
pub mod emit;
pub mod input;
pub mod pack;
pub mod quantize;
pub mod resize;
