//! Confidence filtering and de-duplication shared by every model generation.

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::coco_classes::Labels;
use crate::detection::{BoxFormat, Detection};
use crate::nms::non_max_suppression;

pub const DEFAULT_CONFIDENCE: f32 = 0.5;
pub const DEFAULT_NMS_IOU: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Candidates must score strictly above this.
    pub confidence: f32,
    /// Overlap above which the weaker of two boxes is dropped.
    pub nms_iou: f32,
    pub class_agnostic: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            nms_iou: DEFAULT_NMS_IOU,
            class_agnostic: true,
        }
    }
}

/// Drops candidates at or below the confidence threshold, then runs NMS.
pub fn filter_candidates(candidates: Vec<Bbox>, thresholds: &Thresholds) -> Vec<Bbox> {
    let total = candidates.len();
    let confident: Vec<Bbox> = candidates
        .into_iter()
        .filter(|b| b.confidence > thresholds.confidence)
        .collect();
    let confident_len = confident.len();
    let kept = non_max_suppression(confident, thresholds.nms_iou, thresholds.class_agnostic);
    log::trace!(
        "post-filter: {total} candidates, {confident_len} above {}, {} after nms",
        thresholds.confidence,
        kept.len()
    );
    kept
}

/// Full post-filter: thresholds, NMS, then label lookup and box encoding.
pub fn to_detections(
    candidates: Vec<Bbox>,
    thresholds: &Thresholds,
    labels: &Labels,
    format: BoxFormat,
) -> Vec<Detection> {
    filter_candidates(candidates, thresholds)
        .iter()
        .map(|bbox| Detection::from_bbox(bbox, labels, format))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        let candidates = vec![
            Bbox::from_xywh(0.0, 0.0, 10.0, 10.0, 0.5, 0),
            Bbox::from_xywh(100.0, 100.0, 10.0, 10.0, 0.51, 0),
        ];
        let kept = filter_candidates(candidates, &Thresholds::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.51);
    }

    #[test]
    fn every_detection_is_above_threshold() {
        let candidates: Vec<Bbox> = (0..50)
            .map(|i| Bbox::from_xywh(i as f32 * 20.0, 0.0, 10.0, 10.0, i as f32 / 50.0, 0))
            .collect();
        let labels = Labels::coco();
        let dets = to_detections(candidates, &Thresholds::default(), &labels, BoxFormat::Xywh);
        assert!(!dets.is_empty());
        assert!(dets.iter().all(|d| d.confidence > 0.5));
    }

    #[test]
    fn single_object_yields_single_detection() {
        let labels = Labels::coco();
        let dets = to_detections(
            vec![Bbox::from_xywh(12.0, 30.0, 40.0, 80.0, 0.9, 16)],
            &Thresholds::default(),
            &labels,
            BoxFormat::Xywh,
        );
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].label, "dog");
        assert_eq!(dets[0].confidence, 0.9);
        assert_eq!(dets[0].bbox, [12, 30, 40, 80]);
    }
}
