//! Resizing: shrink an image into the requested `maxSize` box.
//!
//! `maxSize` is a cap: images already inside the box keep their size, larger
//! ones are scaled down to fit, preserving aspect ratio, with Lanczos3.

use crate::config::MaxSize;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Target dimensions for fitting `(width, height)` inside `max`, or `None`
/// when the image already fits.
pub fn fit_within(width: u32, height: u32, max: MaxSize) -> Option<(u32, u32)> {
    if width <= max.width && height <= max.height {
        return None;
    }

    let w_ratio = max.width as f64 / width as f64;
    let h_ratio = max.height as f64 / height as f64;

    let (w, h) = if w_ratio < h_ratio {
        (max.width, (height as f64 * w_ratio).round() as u32)
    } else {
        ((width as f64 * h_ratio).round() as u32, max.height)
    };

    Some((w.clamp(1, max.width), h.clamp(1, max.height)))
}

/// Apply the size cap, if any.
pub fn apply_max_size(img: DynamicImage, max: Option<MaxSize>) -> DynamicImage {
    let Some(max) = max else {
        return img;
    };

    match fit_within(img.width(), img.height(), max) {
        Some((w, h)) => {
            debug!(
                "Resizing {}x{} → {}x{} (cap {}x{})",
                img.width(),
                img.height(),
                w,
                h,
                max.width,
                max.height
            );
            img.resize_exact(w, h, FilterType::Lanczos3)
        }
        None => img,
    }
}
