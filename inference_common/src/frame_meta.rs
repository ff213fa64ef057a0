use serde::{Deserialize, Serialize};

use crate::detection::Detection;

/// Detections found in one sampled video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    pub frame_number: u64,
    pub timestamp: f64,
    pub detections: Vec<Detection>,
}

impl FrameMeta {
    /// Key the frame is reported under, seconds with millisecond precision.
    pub fn timestamp_key(&self) -> String {
        format!("{:.3}", self.timestamp)
    }
}
