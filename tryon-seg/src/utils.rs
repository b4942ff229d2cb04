//! Tensor conversion helpers

use crate::error::SegmentationError;
use image::{GrayImage, ImageFormat, RgbImage};
use std::path::Path;

/// Reshape an RGB image into a BGR planar tensor [3, H, W] scaled to [0, 1]
pub fn rgb_to_bgr_chw(image: &RgbImage) -> Vec<f32> {
    let (w, h) = image.dimensions();
    let plane = (w as usize) * (h as usize);
    let mut chw = vec![0.0f32; plane * 3];

    for (i, pixel) in image.pixels().enumerate() {
        let [r, g, b] = pixel.0;
        chw[i] = b as f32 / 255.0;
        chw[plane + i] = g as f32 / 255.0;
        chw[2 * plane + i] = r as f32 / 255.0;
    }

    chw
}

/// Turn per-pixel foreground probabilities into an 8-bit mask.
///
/// Values are clamped to [0, 1] and scaled by 255 with truncation;
/// non-finite values become 0.
pub fn probabilities_to_gray(values: &[f32], width: u32, height: u32) -> Result<GrayImage, SegmentationError> {
    let expected = (width as usize) * (height as usize);
    if values.len() != expected {
        return Err(SegmentationError::PredictionShape {
            expected,
            actual: values.len(),
        });
    }

    let pixels: Vec<u8> = values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                (v.clamp(0.0, 1.0) * 255.0) as u8
            } else {
                0
            }
        })
        .collect();

    GrayImage::from_raw(width, height, pixels)
        .ok_or_else(|| SegmentationError::Inference("Mask buffer does not match dimensions".to_string()))
}

/// Write a mask as PNG, creating parent directories as needed
pub fn save_mask(mask: &GrayImage, path: &Path) -> Result<(), SegmentationError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    mask.save_with_format(path, ImageFormat::Png)
        .map_err(|source| SegmentationError::ImageWrite {
            path: path.to_path_buf(),
            source,
        })
}
