//! Segmentation pipelines

pub mod refine;
pub mod segmentation;

pub use refine::{refine_mask, refine_mask_file, RefinedMask};
pub use segmentation::HumanSegmenter;
