//! Error types for tryon-pose

use std::path::PathBuf;
use thiserror::Error;
use tryon_core::Error as CoreError;

/// Pose estimation and keypoint extraction errors
#[derive(Error, Debug)]
pub enum PoseError {
    #[error("Failed to launch pose estimator {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Pose estimator exited with {}: {stderr}", describe_exit(.code))]
    ProcessFailed { code: Option<i32>, stderr: String },

    #[error("No JSON pose data appeared in {} after {attempts} attempts", .dir.display())]
    ArtifactTimeout { dir: PathBuf, attempts: u32 },

    #[error("No JSON pose files found in {location}")]
    NoArtifacts { location: String },

    #[error("Malformed pose result in {origin}: {source}")]
    MalformedResult {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Malformed keypoints: expected at least {expected} values, got {actual}")]
    MalformedKeypoints { expected: usize, actual: usize },

    #[error("No person detected")]
    NoPersonDetected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl From<PoseError> for CoreError {
    fn from(err: PoseError) -> Self {
        CoreError::Pose(err.to_string())
    }
}
