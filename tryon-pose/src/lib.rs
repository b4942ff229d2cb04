//! tryon-pose: pose keypoints for the try-on pipeline
//!
//! Drives an external OpenPose executable and turns its JSON output into a
//! labelled keypoint map:
//! - BODY_25 keypoint schema
//! - Command construction and process launch behind a `ProcessRunner` seam
//! - Bounded polling for result files with an injectable `Sleeper`
//! - First-person keypoint extraction

pub mod error;
pub mod extractor;
pub mod invoker;
pub mod keypoints;
pub mod poll;
pub mod process;
pub mod schema;

pub use error::PoseError;
pub use extractor::{
    collect_json_files, extract_from_file, extract_from_result, extract_from_str, extract_keypoints,
    extract_keypoints_from_dir, RawPerson, RawPoseResult,
};
pub use invoker::{PoseCommand, PoseInvoker};
pub use keypoints::{Keypoint, KeypointMap};
pub use poll::{BoundedPoll, PollExhausted, Sleeper, TokioSleeper};
pub use process::{ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use schema::BodyPart;
