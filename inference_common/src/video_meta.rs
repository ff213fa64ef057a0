use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::detection::LabelCounts;
use crate::frame_meta::FrameMeta;

/// Frames keyed by their timestamp, in decode order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FramesByTimestamp(Vec<FrameMeta>);

impl FramesByTimestamp {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameMeta> {
        self.0.iter()
    }
}

impl Serialize for FramesByTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for frame in &self.0 {
            map.serialize_entry(&frame.timestamp_key(), &frame.detections)?;
        }
        map.end()
    }
}

/// Aggregated detection result of one video.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct VideoMeta {
    /// Sampled frames that went through inference, with or without hits.
    pub total_frames_processed: u64,
    pub detections: FramesByTimestamp,
    pub label_counts: LabelCounts,
    /// Every frame the decoder produced, sampled or not.
    #[serde(skip)]
    pub frames_decoded: u64,
}

impl VideoMeta {
    /// Records a processed frame. Frames without detections only bump the counter.
    ///
    /// A frame whose timestamp key equals the previous one's is merged into it.
    pub fn push(&mut self, frame: FrameMeta) {
        self.total_frames_processed += 1;
        if frame.detections.is_empty() {
            return;
        }
        self.label_counts.tally(&frame.detections);
        match self.detections.0.last_mut() {
            Some(last) if last.timestamp_key() == frame.timestamp_key() => {
                last.detections.extend(frame.detections);
            }
            _ => self.detections.0.push(frame),
        }
    }
}
