//! Human segmentation: image in, grayscale foreground mask out

use crate::error::SegmentationError;
use crate::models::{InputTensor, MaskPredictor};
use crate::utils::{probabilities_to_gray, rgb_to_bgr_chw, save_mask};
use image::imageops::FilterType;
use image::GrayImage;
use std::path::Path;
use tracing::{debug, info};
use tryon_core::SegmentationConfig;

/// Runs a mask predictor over a single image
pub struct HumanSegmenter<P> {
    config: SegmentationConfig,
    predictor: P,
}

impl<P: MaskPredictor> HumanSegmenter<P> {
    pub fn new(config: SegmentationConfig, predictor: P) -> Self {
        Self { config, predictor }
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Segment the configured input image into the configured mask path
    pub fn run(&mut self) -> Result<GrayImage, SegmentationError> {
        let input = self.config.input_image.clone();
        let output = self.config.mask_path.clone();
        self.segment(&input, &output)
    }

    /// Segment `input_image` and write the mask to `mask_path`.
    ///
    /// The mask is produced at the network's working resolution
    /// (`input_size` square), not the source image size.
    pub fn segment(&mut self, input_image: &Path, mask_path: &Path) -> Result<GrayImage, SegmentationError> {
        let mask = self.predict_mask(input_image)?;
        save_mask(&mask, mask_path)?;
        info!("Segmentation mask written to {:?}", mask_path);
        Ok(mask)
    }

    /// Predict a mask without writing it
    pub fn predict_mask(&mut self, input_image: &Path) -> Result<GrayImage, SegmentationError> {
        let input = self.preprocess(input_image)?;

        let probabilities = self.predictor.predict(&input)?;
        if probabilities.len() != input.plane_len() {
            return Err(SegmentationError::PredictionShape {
                expected: input.plane_len(),
                actual: probabilities.len(),
            });
        }

        probabilities_to_gray(&probabilities, input.size, input.size)
    }

    fn preprocess(&self, input_image: &Path) -> Result<InputTensor, SegmentationError> {
        let size = self.config.input_size;
        if size == 0 {
            return Err(SegmentationError::Config("input_size must be greater than 0".to_string()));
        }

        let image = image::open(input_image).map_err(|source| SegmentationError::ImageRead {
            path: input_image.to_path_buf(),
            source,
        })?;
        debug!(
            "Loaded {:?} ({}x{}), resizing to {}x{}",
            input_image,
            image.width(),
            image.height(),
            size,
            size
        );

        let resized = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
        Ok(InputTensor {
            size,
            data: rgb_to_bgr_chw(&resized),
        })
    }
}
