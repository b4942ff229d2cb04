//! Keypoint extraction over result files on disk

use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use tryon_pose::{collect_json_files, extract_keypoints, BodyPart, KeypointMap, PoseError};

fn write_result(dir: &TempDir, name: &str, people: serde_json::Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, json!({ "version": 1.3, "people": people }).to_string()).unwrap();
    path
}

fn keypoints(seed: f64) -> Vec<f64> {
    (0..75).map(|i| seed + i as f64 * 0.5).collect()
}

#[test]
fn test_one_person_yields_every_label() {
    let dir = TempDir::new().unwrap();
    let values = keypoints(10.0);
    write_result(&dir, "img_keypoints.json", json!([{ "pose_keypoints_2d": values }]));

    let files = collect_json_files(dir.path()).unwrap();
    let map = extract_keypoints(&files).unwrap();

    assert_eq!(map.len(), 25);
    for part in BodyPart::ALL {
        let i = part.index();
        assert_eq!(map.get_label(part.label()), Some((values[3 * i], values[3 * i + 1])));
    }
}

#[test]
fn test_zero_people_yields_empty_map() {
    let dir = TempDir::new().unwrap();
    let path = write_result(&dir, "img_keypoints.json", json!([]));

    let map = extract_keypoints(&[path]).unwrap();
    assert!(map.is_empty());
    assert!(matches!(map.require_person(), Err(PoseError::NoPersonDetected)));
}

#[test]
fn test_second_person_never_leaks() {
    let dir = TempDir::new().unwrap();
    let first = keypoints(1.0);
    let second = keypoints(5000.0);
    let path = write_result(
        &dir,
        "img_keypoints.json",
        json!([{ "pose_keypoints_2d": first }, { "pose_keypoints_2d": second }]),
    );

    let map = extract_keypoints(&[path]).unwrap();
    assert_eq!(map.len(), 25);
    for kp in &map {
        assert!(!second.contains(&kp.x), "{} x leaked from second person", kp.part);
        assert!(!second.contains(&kp.y), "{} y leaked from second person", kp.part);
    }
}

#[test]
fn test_empty_candidates_is_missing_artifact() {
    let dir = TempDir::new().unwrap();
    let files = collect_json_files(dir.path()).unwrap();
    assert!(matches!(extract_keypoints(&files), Err(PoseError::NoArtifacts { .. })));
}

#[test]
fn test_invalid_json_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ people: ").unwrap();
    assert!(matches!(extract_keypoints(&[path]), Err(PoseError::MalformedResult { .. })));
}

#[test]
fn test_map_handoff_file() {
    let dir = TempDir::new().unwrap();
    let map = KeypointMap::from_flat(&keypoints(0.0)).unwrap();
    let out = dir.path().join("handoff").join("keypoints.json");
    map.write_json(&out).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["Nose"], json!([0.0, 0.5]));
    assert_eq!(value.as_object().unwrap().len(), 25);
}

#[test]
fn test_coordinates_are_not_narrowed() {
    let dir = TempDir::new().unwrap();
    let mut values = keypoints(0.0);
    values[0] = 1234.56789;
    values[1] = 0.1;
    values[3] = 16777217.0;
    values[4] = 987.654321098765;
    let path = write_result(&dir, "img_keypoints.json", json!([{ "pose_keypoints_2d": values }]));

    let map = extract_keypoints(&[path]).unwrap();
    assert_eq!(map.get(BodyPart::Nose), Some((1234.56789, 0.1)));
    assert_eq!(map.get(BodyPart::Neck), Some((16777217.0, 987.654321098765)));

    let out = dir.path().join("keypoints.json");
    map.write_json(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["Nose"], json!([1234.56789, 0.1]));
    assert_eq!(value["Neck"], json!([16777217.0, 987.654321098765]));
}
