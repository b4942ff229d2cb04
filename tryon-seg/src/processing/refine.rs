//! Mask refinement: binarize, trace contours, paint each region by index

use crate::error::SegmentationError;
use crate::utils::save_mask;
use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::contrast::threshold;
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use std::path::Path;
use tracing::{debug, info, warn};

/// Output of [`refine_mask`]
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedMask {
    pub image: GrayImage,
    /// Number of contours painted, outer borders and holes alike
    pub contours: usize,
    /// Whether any contour index exceeded the 8-bit intensity range
    pub saturated: bool,
}

/// Intensity used for the contour at `index`, saturating at 255
pub fn contour_intensity(index: usize, step: u8) -> (u8, bool) {
    let value = (index as u64).saturating_mul(step as u64);
    if value > u8::MAX as u64 {
        (u8::MAX, true)
    } else {
        (value as u8, false)
    }
}

/// Refine a raw segmentation mask.
///
/// Pixels strictly above `thresh` are foreground. Every contour of the
/// binary mask, including hole borders, is filled on a black canvas with
/// `index * step` in discovery order, so later contours overwrite earlier
/// ones where they overlap. The index is positional only.
pub fn refine_mask(mask: &GrayImage, thresh: u8, step: u8) -> RefinedMask {
    let binary = threshold(mask, thresh);
    let contours = find_contours::<i32>(&binary);
    debug!("Found {} contours above threshold {}", contours.len(), thresh);

    let (width, height) = mask.dimensions();
    let mut canvas = GrayImage::new(width, height);
    let mut saturated = false;

    for (index, contour) in contours.iter().enumerate() {
        let (value, clipped) = contour_intensity(index, step);
        if clipped && !saturated {
            warn!(
                "Contour {} exceeds the intensity range with step {}, remaining contours painted at 255",
                index, step
            );
        }
        saturated |= clipped;
        fill_contour(&mut canvas, &contour.points, Luma([value]));
    }

    RefinedMask {
        image: canvas,
        contours: contours.len(),
        saturated,
    }
}

/// Read a mask from `mask_path`, refine it, and write the result to `output_path`
pub fn refine_mask_file(
    mask_path: &Path,
    output_path: &Path,
    thresh: u8,
    step: u8,
) -> Result<RefinedMask, SegmentationError> {
    let mask = image::open(mask_path)
        .map_err(|source| SegmentationError::ImageRead {
            path: mask_path.to_path_buf(),
            source,
        })?
        .to_luma8();

    let refined = refine_mask(&mask, thresh, step);
    save_mask(&refined.image, output_path)?;
    info!(
        "Refined mask with {} contours written to {:?}",
        refined.contours, output_path
    );
    Ok(refined)
}

fn fill_contour(canvas: &mut GrayImage, points: &[Point<i32>], color: Luma<u8>) {
    let mut polygon = points.to_vec();
    polygon.dedup();
    // draw_polygon_mut rejects explicitly closed polygons
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    if polygon.len() < 3 {
        let (width, height) = canvas.dimensions();
        for p in &polygon {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                canvas.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        return;
    }

    draw_polygon_mut(canvas, &polygon, color);
}
