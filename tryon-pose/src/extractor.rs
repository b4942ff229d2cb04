//! Keypoint extraction from OpenPose JSON output

use crate::error::PoseError;
use crate::keypoints::KeypointMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One OpenPose result file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPoseResult {
    #[serde(default)]
    pub version: Option<f64>,
    #[serde(default)]
    pub people: Option<Vec<RawPerson>>,
}

/// One detected person; only the body keypoints are read
#[derive(Debug, Clone, Deserialize)]
pub struct RawPerson {
    pub pose_keypoints_2d: Vec<f64>,
}

impl RawPoseResult {
    pub fn first_person(&self) -> Option<&RawPerson> {
        self.people.as_ref().and_then(|people| people.first())
    }
}

/// List `*.json` files in `dir`, sorted by file name.
///
/// A directory that does not exist yet yields an empty list.
pub fn collect_json_files(dir: &Path) -> Result<Vec<PathBuf>, PoseError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Extract keypoints from the first file of a candidate list
pub fn extract_keypoints(files: &[PathBuf]) -> Result<KeypointMap, PoseError> {
    let first = files.first().ok_or_else(|| PoseError::NoArtifacts {
        location: "the candidate list".to_string(),
    })?;
    if files.len() > 1 {
        debug!("{} result files found, using {:?}", files.len(), first);
    }
    extract_from_file(first)
}

/// Extract keypoints from the first (sorted) JSON file in `dir`
pub fn extract_keypoints_from_dir(dir: &Path) -> Result<KeypointMap, PoseError> {
    let files = collect_json_files(dir)?;
    if files.is_empty() {
        return Err(PoseError::NoArtifacts {
            location: dir.display().to_string(),
        });
    }
    extract_keypoints(&files)
}

pub fn extract_from_file(path: &Path) -> Result<KeypointMap, PoseError> {
    let content = std::fs::read_to_string(path)?;
    let result: RawPoseResult = serde_json::from_str(&content).map_err(|source| PoseError::MalformedResult {
        origin: path.display().to_string(),
        source,
    })?;
    extract_from_result(&result)
}

pub fn extract_from_str(json: &str) -> Result<KeypointMap, PoseError> {
    let result: RawPoseResult = serde_json::from_str(json).map_err(|source| PoseError::MalformedResult {
        origin: "<inline>".to_string(),
        source,
    })?;
    extract_from_result(&result)
}

/// Map the first detected person; no person yields an empty map
pub fn extract_from_result(result: &RawPoseResult) -> Result<KeypointMap, PoseError> {
    match result.first_person() {
        Some(person) => KeypointMap::from_flat(&person.pose_keypoints_2d),
        None => {
            warn!("Pose result contains no people, returning empty keypoint map");
            Ok(KeypointMap::new())
        }
    }
}
