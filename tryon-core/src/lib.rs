//! tryon-core: shared configuration and error types for the try-on
//! preprocessing pipeline.

pub mod config;
pub mod error;

pub use config::{ConfigError, PoseConfig, SegmentationConfig, TryOnConfig};
pub use error::{Error, Result};
