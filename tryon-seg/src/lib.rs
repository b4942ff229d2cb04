//! tryon-seg: background removal and mask refinement
//!
//! Runs a pretrained U2-Net style network to produce a grayscale human mask,
//! then splits the thresholded mask into contour-labelled regions.

pub mod error;
pub mod models;
pub mod processing;
mod utils;

pub use error::SegmentationError;
pub use models::{InputTensor, MaskPredictor};
pub use processing::{refine_mask, refine_mask_file, HumanSegmenter, RefinedMask};

#[cfg(feature = "onnx")]
pub use models::U2NetOnnx;
