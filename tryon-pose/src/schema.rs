//! BODY_25 keypoint schema used by OpenPose

use serde::{Deserialize, Serialize};

/// OpenPose BODY_25 keypoint slots, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    Neck = 1,
    RShoulder = 2,
    RElbow = 3,
    RWrist = 4,
    LShoulder = 5,
    LElbow = 6,
    LWrist = 7,
    MidHip = 8,
    RHip = 9,
    RKnee = 10,
    RAnkle = 11,
    LHip = 12,
    LKnee = 13,
    LAnkle = 14,
    REye = 15,
    LEye = 16,
    REar = 17,
    LEar = 18,
    LBigToe = 19,
    LSmallToe = 20,
    LHeel = 21,
    RBigToe = 22,
    RSmallToe = 23,
    RHeel = 24,
}

impl BodyPart {
    pub const COUNT: usize = 25;

    /// Values per keypoint in the flat `pose_keypoints_2d` array (x, y, confidence)
    pub const STRIDE: usize = 3;

    pub const ALL: [BodyPart; BodyPart::COUNT] = [
        BodyPart::Nose,
        BodyPart::Neck,
        BodyPart::RShoulder,
        BodyPart::RElbow,
        BodyPart::RWrist,
        BodyPart::LShoulder,
        BodyPart::LElbow,
        BodyPart::LWrist,
        BodyPart::MidHip,
        BodyPart::RHip,
        BodyPart::RKnee,
        BodyPart::RAnkle,
        BodyPart::LHip,
        BodyPart::LKnee,
        BodyPart::LAnkle,
        BodyPart::REye,
        BodyPart::LEye,
        BodyPart::REar,
        BodyPart::LEar,
        BodyPart::LBigToe,
        BodyPart::LSmallToe,
        BodyPart::LHeel,
        BodyPart::RBigToe,
        BodyPart::RSmallToe,
        BodyPart::RHeel,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            BodyPart::Nose => "Nose",
            BodyPart::Neck => "Neck",
            BodyPart::RShoulder => "RShoulder",
            BodyPart::RElbow => "RElbow",
            BodyPart::RWrist => "RWrist",
            BodyPart::LShoulder => "LShoulder",
            BodyPart::LElbow => "LElbow",
            BodyPart::LWrist => "LWrist",
            BodyPart::MidHip => "MidHip",
            BodyPart::RHip => "RHip",
            BodyPart::RKnee => "RKnee",
            BodyPart::RAnkle => "RAnkle",
            BodyPart::LHip => "LHip",
            BodyPart::LKnee => "LKnee",
            BodyPart::LAnkle => "LAnkle",
            BodyPart::REye => "REye",
            BodyPart::LEye => "LEye",
            BodyPart::REar => "REar",
            BodyPart::LEar => "LEar",
            BodyPart::LBigToe => "LBigToe",
            BodyPart::LSmallToe => "LSmallToe",
            BodyPart::LHeel => "LHeel",
            BodyPart::RBigToe => "RBigToe",
            BodyPart::RSmallToe => "RSmallToe",
            BodyPart::RHeel => "RHeel",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|part| part.label() == label)
    }
}

impl std::fmt::Display for BodyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
