//! Labelled keypoint map, the terminal artifact of pose extraction

use crate::error::PoseError;
use crate::schema::BodyPart;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image-space coordinate of one body part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub part: BodyPart,
    pub x: f64,
    pub y: f64,
}

/// Body-part label to (x, y) mapping, kept in BODY_25 slot order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypointMap {
    points: Vec<Keypoint>,
}

impl KeypointMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from one person's flat `[x0, y0, c0, x1, y1, c1, ...]` array.
    ///
    /// Slot `i` reads offsets `3i` and `3i + 1`; confidence is dropped.
    /// Values beyond the 25th triple are ignored.
    pub fn from_flat(values: &[f64]) -> Result<Self, PoseError> {
        let expected = BodyPart::COUNT * BodyPart::STRIDE;
        if values.len() < expected {
            return Err(PoseError::MalformedKeypoints {
                expected,
                actual: values.len(),
            });
        }

        let points = BodyPart::ALL
            .iter()
            .map(|&part| {
                let offset = part.index() * BodyPart::STRIDE;
                Keypoint {
                    part,
                    x: values[offset],
                    y: values[offset + 1],
                }
            })
            .collect();

        Ok(Self { points })
    }

    /// Insert or replace the coordinate for `part`
    pub fn insert(&mut self, part: BodyPart, x: f64, y: f64) {
        match self.points.binary_search_by_key(&part, |kp| kp.part) {
            Ok(pos) => {
                self.points[pos].x = x;
                self.points[pos].y = y;
            }
            Err(pos) => self.points.insert(pos, Keypoint { part, x, y }),
        }
    }

    pub fn get(&self, part: BodyPart) -> Option<(f64, f64)> {
        self.points
            .binary_search_by_key(&part, |kp| kp.part)
            .ok()
            .map(|pos| (self.points[pos].x, self.points[pos].y))
    }

    pub fn get_label(&self, label: &str) -> Option<(f64, f64)> {
        BodyPart::from_label(label).and_then(|part| self.get(part))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keypoint> {
        self.points.iter()
    }

    /// Treat an empty map as a failure instead of a valid result
    pub fn require_person(self) -> Result<Self, PoseError> {
        if self.is_empty() {
            Err(PoseError::NoPersonDetected)
        } else {
            Ok(self)
        }
    }

    /// Write the map as pretty JSON, creating parent directories
    pub fn write_json(&self, path: &Path) -> Result<(), PoseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| PoseError::MalformedResult {
            origin: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a KeypointMap {
    type Item = &'a Keypoint;
    type IntoIter = std::slice::Iter<'a, Keypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl Serialize for KeypointMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.points.len()))?;
        for kp in &self.points {
            map.serialize_entry(kp.part.label(), &[kp.x, kp.y])?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeypointMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeypointMapVisitor;

        impl<'de> Visitor<'de> for KeypointMapVisitor {
            type Value = KeypointMap;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of body-part labels to [x, y] pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = KeypointMap::new();
                while let Some((label, [x, y])) = access.next_entry::<String, [f64; 2]>()? {
                    let part = BodyPart::from_label(&label)
                        .ok_or_else(|| de::Error::custom(format!("unknown body part '{}'", label)))?;
                    map.insert(part, x, y);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(KeypointMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(len: usize) -> Vec<f64> {
        (0..len).map(|i| i as f64).collect()
    }

    #[test]
    fn test_from_flat_reads_xy_and_drops_confidence() {
        let map = KeypointMap::from_flat(&flat(75)).unwrap();
        assert_eq!(map.len(), 25);
        assert_eq!(map.get(BodyPart::Nose), Some((0.0, 1.0)));
        assert_eq!(map.get(BodyPart::Neck), Some((3.0, 4.0)));
        assert_eq!(map.get(BodyPart::RHeel), Some((72.0, 73.0)));
        assert!(map.iter().all(|kp| kp.x != 2.0 && kp.y != 2.0));
    }

    #[test]
    fn test_from_flat_short_array() {
        let err = KeypointMap::from_flat(&flat(74)).unwrap_err();
        match err {
            PoseError::MalformedKeypoints { expected, actual } => {
                assert_eq!(expected, 75);
                assert_eq!(actual, 74);
            }
            other => panic!("Expected MalformedKeypoints, got {:?}", other),
        }
    }

    #[test]
    fn test_from_flat_ignores_trailing_values() {
        let map = KeypointMap::from_flat(&flat(80)).unwrap();
        assert_eq!(map.len(), 25);
    }

    #[test]
    fn test_insert_keeps_slot_order() {
        let mut map = KeypointMap::new();
        map.insert(BodyPart::RHeel, 1.0, 1.0);
        map.insert(BodyPart::Nose, 2.0, 2.0);
        map.insert(BodyPart::MidHip, 3.0, 3.0);
        map.insert(BodyPart::Nose, 4.0, 5.0);

        let order: Vec<BodyPart> = map.iter().map(|kp| kp.part).collect();
        assert_eq!(order, vec![BodyPart::Nose, BodyPart::MidHip, BodyPart::RHeel]);
        assert_eq!(map.get_label("Nose"), Some((4.0, 5.0)));
    }

    #[test]
    fn test_require_person() {
        assert!(matches!(
            KeypointMap::new().require_person(),
            Err(PoseError::NoPersonDetected)
        ));
        assert!(KeypointMap::from_flat(&flat(75)).unwrap().require_person().is_ok());
    }

    #[test]
    fn test_json_shape() {
        let mut map = KeypointMap::new();
        map.insert(BodyPart::Neck, 10.5, 20.0);
        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value, serde_json::json!({ "Neck": [10.5, 20.0] }));

        let back: KeypointMap = serde_json::from_value(value).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_json_keeps_full_precision() {
        let mut map = KeypointMap::new();
        map.insert(BodyPart::Nose, 1234.56789, 0.1);
        map.insert(BodyPart::Neck, 16777217.0, 123.456789012345);

        let text = serde_json::to_string(&map).unwrap();
        assert_eq!(text, r#"{"Nose":[1234.56789,0.1],"Neck":[16777217.0,123.456789012345]}"#);

        let back: KeypointMap = serde_json::from_str(&text).unwrap();
        assert_eq!(back.get(BodyPart::Neck), Some((16777217.0, 123.456789012345)));
    }

    #[test]
    fn test_json_unknown_label() {
        let result: Result<KeypointMap, _> = serde_json::from_str(r#"{ "Tail": [1.0, 2.0] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("keypoints.json");
        let map = KeypointMap::from_flat(&flat(75)).unwrap();
        map.write_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: KeypointMap = serde_json::from_str(&text).unwrap();
        assert_eq!(back, map);
    }
}
