// Configuration for the try-on preprocessing pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// External pose estimator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Path to the OpenPose executable
    pub openpose_bin: PathBuf,
    /// OpenPose model assets directory (`--model_folder`)
    pub model_folder: PathBuf,
    /// Directory of input images (`--image_dir`)
    pub image_dir: PathBuf,
    /// Directory the estimator writes JSON results into (`--write_json`)
    pub json_dir: PathBuf,
    /// Directory for rendered pose images (`--write_images`), disabled when `None`
    pub render_dir: Option<PathBuf>,
    /// Ask the estimator to render the skeleton (`--render_pose`)
    pub render_pose: bool,
    /// Show the estimator's own window (`--display`)
    pub display: bool,
    /// Number of times the JSON directory is checked after the process exits
    pub poll_attempts: u32,
    /// Delay between two checks, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for PoseConfig {
    fn default() -> Self {
        let openpose_bin = if cfg!(windows) {
            PathBuf::from("openpose/bin/OpenPoseDemo.exe")
        } else {
            PathBuf::from("openpose/bin/OpenPoseDemo")
        };

        Self {
            openpose_bin,
            model_folder: PathBuf::from("openpose/models"),
            image_dir: PathBuf::from("input"),
            json_dir: PathBuf::from("pose_output"),
            render_dir: Some(PathBuf::from("pose_images")),
            render_pose: true,
            display: false,
            poll_attempts: 10,
            poll_interval_ms: 1000,
        }
    }
}

impl PoseConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Background removal and mask refinement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Image to segment
    pub input_image: PathBuf,
    /// U2-Net weights (ONNX export)
    pub weights_path: PathBuf,
    /// Where the raw network mask is written
    pub mask_path: PathBuf,
    /// Where the contour-labelled mask is written
    pub refined_mask_path: PathBuf,
    /// Square side the input is resized to before inference
    pub input_size: u32,
    /// Binary threshold applied before contour extraction
    pub threshold: u8,
    /// Intensity added per contour index when painting the refined mask
    pub intensity_step: u8,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            input_image: PathBuf::from("input/user_image.jpg"),
            weights_path: PathBuf::from("model/u2net.onnx"),
            mask_path: PathBuf::from("segmentation_output/mask.png"),
            refined_mask_path: PathBuf::from("segmentation_output/refined_mask.png"),
            input_size: 320,
            threshold: 128,
            intensity_step: 30,
        }
    }
}

/// Top-level pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TryOnConfig {
    pub pose: PoseConfig,
    pub segmentation: SegmentationConfig,
}

impl TryOnConfig {
    /// Load configuration from a JSON, TOML or YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    /// Load configuration from string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        // Try JSON first
        if let Ok(config) = serde_json::from_str::<TryOnConfig>(content) {
            return Ok(config);
        }

        // Try TOML
        if let Ok(config) = toml::from_str::<TryOnConfig>(content) {
            return Ok(config);
        }

        // Try YAML
        if let Ok(config) = serde_yaml::from_str::<TryOnConfig>(content) {
            return Ok(config);
        }

        Err(ConfigError::ParseError("Unknown format (expected JSON, TOML or YAML)".to_string()))
    }

    /// Defaults with `TRYON_*` environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `TRYON_*` environment overrides on top of the current values
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str| lookup(key).map(PathBuf::from);

        if let Some(p) = path("TRYON_OPENPOSE_BIN") {
            self.pose.openpose_bin = p;
        }
        if let Some(p) = path("TRYON_MODEL_FOLDER") {
            self.pose.model_folder = p;
        }
        if let Some(p) = path("TRYON_IMAGE_DIR") {
            self.pose.image_dir = p;
        }
        if let Some(p) = path("TRYON_JSON_DIR") {
            self.pose.json_dir = p;
        }
        if let Some(dir) = lookup("TRYON_RENDER_DIR") {
            // Empty value disables rendered output
            self.pose.render_dir = if dir.is_empty() { None } else { Some(PathBuf::from(dir)) };
        }
        if let Some(v) = lookup("TRYON_POLL_ATTEMPTS") {
            self.pose.poll_attempts = v
                .parse()
                .map_err(|_| ConfigError::ParseError(format!("TRYON_POLL_ATTEMPTS: invalid value '{}'", v)))?;
        }
        if let Some(v) = lookup("TRYON_POLL_INTERVAL_MS") {
            self.pose.poll_interval_ms = v
                .parse()
                .map_err(|_| ConfigError::ParseError(format!("TRYON_POLL_INTERVAL_MS: invalid value '{}'", v)))?;
        }
        if let Some(p) = path("TRYON_INPUT_IMAGE") {
            self.segmentation.input_image = p;
        }
        if let Some(p) = path("TRYON_WEIGHTS") {
            self.segmentation.weights_path = p;
        }
        if let Some(p) = path("TRYON_MASK_PATH") {
            self.segmentation.mask_path = p;
        }
        if let Some(p) = path("TRYON_REFINED_MASK_PATH") {
            self.segmentation.refined_mask_path = p;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("pose.openpose_bin", &self.pose.openpose_bin),
            ("pose.model_folder", &self.pose.model_folder),
            ("pose.image_dir", &self.pose.image_dir),
            ("pose.json_dir", &self.pose.json_dir),
            ("segmentation.input_image", &self.segmentation.input_image),
            ("segmentation.weights_path", &self.segmentation.weights_path),
            ("segmentation.mask_path", &self.segmentation.mask_path),
            ("segmentation.refined_mask_path", &self.segmentation.refined_mask_path),
        ];
        for (name, path) in required {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(format!("{} must not be empty", name)));
            }
        }

        if matches!(&self.pose.render_dir, Some(dir) if dir.as_os_str().is_empty()) {
            return Err(ConfigError::ValidationError(
                "pose.render_dir must not be empty when set".to_string(),
            ));
        }

        if self.pose.poll_attempts == 0 {
            return Err(ConfigError::ValidationError("pose.poll_attempts must be at least 1".to_string()));
        }

        if self.segmentation.input_size == 0 {
            return Err(ConfigError::ValidationError("segmentation.input_size must be non-zero".to_string()));
        }

        if self.segmentation.intensity_step == 0 {
            return Err(ConfigError::ValidationError(
                "segmentation.intensity_step must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
