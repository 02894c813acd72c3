//! Image preprocessing for the leaf classifiers.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::{GrowError, Result};
use crate::inference::manifest::Normalization;

/// Decode an image file into RGB.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .map_err(|e| GrowError::inference(format!("cannot decode {}: {}", path.display(), e)))?;
    Ok(img.to_rgb8())
}

/// Scale `img` so it covers a `size` x `size` square, then crop the center.
pub fn center_crop_resize(img: &RgbImage, size: u32) -> Result<RgbImage> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(GrowError::invalid_input("image has no pixels"));
    }
    if size == 0 {
        return Err(GrowError::invalid_input("input size must be positive"));
    }

    let scale = f64::max(size as f64 / w as f64, size as f64 / h as f64);
    let scaled_w = ((w as f64 * scale).round() as u32).max(size);
    let scaled_h = ((h as f64 * scale).round() as u32).max(size);

    let scaled = imageops::resize(img, scaled_w, scaled_h, FilterType::Triangle);
    let x = (scaled_w - size) / 2;
    let y = (scaled_h - size) / 2;
    Ok(imageops::crop_imm(&scaled, x, y, size, size).to_image())
}

/// Flatten to HWC f32 in 0..1, applying `normalization` when usable.
pub fn to_tensor(img: &RgbImage, normalization: Option<&Normalization>) -> Vec<f32> {
    let norm = normalization.filter(|n| n.is_usable());
    let mut out = Vec::with_capacity(img.as_raw().len());
    for pixel in img.pixels() {
        for (c, &v) in pixel.0.iter().enumerate() {
            let scaled = v as f32 / 255.0;
            out.push(match norm {
                Some(n) => (scaled - n.mean[c]) / n.std[c],
                None => scaled,
            });
        }
    }
    out
}

/// Center-crop, resize and flatten in one step.
pub fn preprocess(
    img: &RgbImage,
    size: u32,
    normalization: Option<&Normalization>,
) -> Result<Vec<f32>> {
    let cropped = center_crop_resize(img, size)?;
    Ok(to_tensor(&cropped, normalization))
}
