//! Error types for tryon-seg

use std::path::PathBuf;
use thiserror::Error;
use tryon_core::Error as CoreError;

#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("Weights file not found: {}", .0.display())]
    MissingWeights(PathBuf),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Failed to read image {}: {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to write image {}: {source}", .path.display())]
    ImageWrite {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Prediction has {actual} values, expected {expected}")]
    PredictionShape { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SegmentationError> for CoreError {
    fn from(err: SegmentationError) -> Self {
        CoreError::Segmentation(err.to_string())
    }
}
