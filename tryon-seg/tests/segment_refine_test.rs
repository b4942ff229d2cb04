//! Segmentation followed by refinement, with a stand-in network

use image::{GrayImage, Rgb, RgbImage};
use std::path::PathBuf;
use tempfile::TempDir;
use tryon_core::SegmentationConfig;
use tryon_seg::{refine_mask_file, HumanSegmenter, InputTensor, MaskPredictor, SegmentationError};

/// Marks two separated squares as foreground at any working size
struct TwoBlobs;

impl MaskPredictor for TwoBlobs {
    fn predict(&mut self, input: &InputTensor) -> Result<Vec<f32>, SegmentationError> {
        let side = input.size as usize;
        let quarter = side / 4;
        Ok((0..side * side)
            .map(|i| {
                let (x, y) = (i % side, i / side);
                let in_top = (quarter..2 * quarter).contains(&y) && (quarter..2 * quarter).contains(&x);
                let in_bottom = (3 * quarter - 2..side - 2).contains(&y) && (quarter..2 * quarter).contains(&x);
                if in_top || in_bottom {
                    0.95
                } else {
                    0.05
                }
            })
            .collect())
    }
}

fn setup() -> (TempDir, SegmentationConfig) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input").join("user_image.png");
    std::fs::create_dir_all(input.parent().unwrap()).unwrap();
    RgbImage::from_pixel(64, 96, Rgb([10, 20, 30])).save(&input).unwrap();

    let config = SegmentationConfig {
        input_image: input,
        weights_path: dir.path().join("model").join("u2net.onnx"),
        mask_path: dir.path().join("segmentation_output").join("mask.png"),
        refined_mask_path: dir.path().join("segmentation_output").join("refined_mask.png"),
        input_size: 32,
        threshold: 128,
        intensity_step: 30,
    };
    (dir, config)
}

#[test]
fn test_segment_then_refine() {
    let (_dir, config) = setup();

    let mut segmenter = HumanSegmenter::new(config.clone(), TwoBlobs);
    let mask = segmenter.run().unwrap();
    assert_eq!(mask.dimensions(), (32, 32));
    // 0.95 * 255 truncates to 242
    assert_eq!(mask.get_pixel(10, 10).0[0], 242);
    assert_eq!(mask.get_pixel(0, 0).0[0], 12);

    let refined = refine_mask_file(
        &config.mask_path,
        &config.refined_mask_path,
        config.threshold,
        config.intensity_step,
    )
    .unwrap();
    assert_eq!(refined.contours, 2);
    assert!(!refined.saturated);
    assert_eq!(refined.image.get_pixel(10, 26).0[0], 30);

    let saved: GrayImage = image::open(&config.refined_mask_path).unwrap().to_luma8();
    assert_eq!(saved.dimensions(), (32, 32));
}

#[test]
fn test_refine_requires_existing_mask() {
    let (_dir, config) = setup();
    let result = refine_mask_file(&config.mask_path, &config.refined_mask_path, 128, 30);
    assert!(matches!(result, Err(SegmentationError::ImageRead { .. })));
    assert!(!config.refined_mask_path.exists());
}

#[test]
fn test_segmentation_error_reaches_core() {
    let (_dir, mut config) = setup();
    config.input_image = PathBuf::from("/nonexistent/user_image.jpg");

    let mut segmenter = HumanSegmenter::new(config, TwoBlobs);
    let err: tryon_core::Error = segmenter.run().unwrap_err().into();
    assert!(matches!(err, tryon_core::Error::Segmentation(_)));
}
