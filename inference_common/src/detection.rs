use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::coco_classes::Labels;

/// Layout of the four integers reported in `Detection::bbox`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxFormat {
    /// `[x, y, width, height]`, top-left corner plus size.
    Xywh,
    /// `[x1, y1, x2, y2]`, opposite corners.
    Xyxy,
}

impl BoxFormat {
    pub fn encode(self, bbox: &Bbox) -> [i32; 4] {
        match self {
            BoxFormat::Xywh => [
                bbox.xmin.round() as i32,
                bbox.ymin.round() as i32,
                bbox.width().round() as i32,
                bbox.height().round() as i32,
            ],
            BoxFormat::Xyxy => [
                bbox.xmin.round() as i32,
                bbox.ymin.round() as i32,
                bbox.xmax.round() as i32,
                bbox.ymax.round() as i32,
            ],
        }
    }
}

/// A single labelled object found in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: [i32; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u64>,
    #[serde(skip)]
    pub class_idx: usize,
}

impl Detection {
    pub fn from_bbox(bbox: &Bbox, labels: &Labels, format: BoxFormat) -> Self {
        Self {
            label: labels.get(bbox.class_idx).to_string(),
            confidence: bbox.confidence,
            bbox: format.encode(bbox),
            timestamp: None,
            frame_number: None,
            class_idx: bbox.class_idx,
        }
    }

    /// Stamps the detection with the video position it was found at.
    pub fn at_frame(mut self, frame_number: u64, timestamp: f64) -> Self {
        self.frame_number = Some(frame_number);
        self.timestamp = Some(timestamp);
        self
    }
}

/// Occurrences per label within one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelCounts(BTreeMap<String, u64>);

impl LabelCounts {
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut counts = Self::default();
        counts.tally(detections);
        counts
    }

    pub fn tally(&mut self, detections: &[Detection]) {
        for detection in detections {
            *self.0.entry(detection.label.clone()).or_default() += 1;
        }
    }

    pub fn get(&self, label: &str) -> u64 {
        self.0.get(label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(label, count)| (label.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(label: &str) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: 0.9,
            bbox: [0, 0, 1, 1],
            timestamp: None,
            frame_number: None,
            class_idx: 0,
        }
    }

    #[test]
    fn xywh_and_xyxy_encodings() {
        let b = Bbox::new(10.0, 20.0, 50.4, 80.6, 0.8, 2);
        assert_eq!(BoxFormat::Xywh.encode(&b), [10, 20, 40, 61]);
        assert_eq!(BoxFormat::Xyxy.encode(&b), [10, 20, 50, 81]);
    }

    #[test]
    fn detection_uses_label_for_class() {
        let labels = Labels::parse("person\nbicycle\ncar");
        let det = Detection::from_bbox(
            &Bbox::from_xywh(1.0, 2.0, 3.0, 4.0, 0.75, 2),
            &labels,
            BoxFormat::Xywh,
        );
        assert_eq!(det.label, "car");
        assert_eq!(det.bbox, [1, 2, 3, 4]);
        assert_eq!(det.class_idx, 2);
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let json = serde_json::to_value(detection("dog")).unwrap();
        assert_eq!(json["label"], "dog");
        assert_eq!(json["box"], serde_json::json!([0, 0, 1, 1]));
        assert!(json.get("timestamp").is_none());
        assert!(json.get("frame_number").is_none());
        assert!(json.get("class_idx").is_none());

        let json = serde_json::to_value(detection("dog").at_frame(10, 0.5)).unwrap();
        assert_eq!(json["frame_number"], 10);
        assert_eq!(json["timestamp"], 0.5);
    }

    #[test]
    fn counts_match_detections_per_label() {
        let dets = vec![detection("person"), detection("car"), detection("person")];
        let counts = LabelCounts::from_detections(&dets);
        assert_eq!(counts.get("person"), 2);
        assert_eq!(counts.get("car"), 1);
        assert_eq!(counts.get("dog"), 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(
            serde_json::to_value(&counts).unwrap(),
            serde_json::json!({"car": 1, "person": 2})
        );
    }
}
