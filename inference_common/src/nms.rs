use crate::bbox::Bbox;

/// Greedy non-max suppression.
///
/// Boxes are visited in descending confidence (ties keep input order); a box
/// is dropped when its IoU with an already kept box is above `iou_threshold`.
/// With `class_agnostic` unset, only boxes of the same class suppress each other.
pub fn non_max_suppression(
    mut boxes: Vec<Bbox>,
    iou_threshold: f32,
    class_agnostic: bool,
) -> Vec<Bbox> {
    boxes.retain(|b| b.confidence.is_finite());
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Bbox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let suppressed = keep.iter().any(|kept| {
            (class_agnostic || kept.class_idx == candidate.class_idx)
                && kept.iou(&candidate) > iou_threshold
        });
        if !suppressed {
            keep.push(candidate);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_highest_of_overlapping_pair() {
        let boxes = vec![
            Bbox::from_xywh(0.0, 0.0, 100.0, 100.0, 0.7, 0),
            Bbox::from_xywh(5.0, 5.0, 100.0, 100.0, 0.9, 0),
        ];
        let kept = non_max_suppression(boxes, 0.3, true);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn low_overlap_boxes_survive() {
        // IoU = 1/3, just above 0.3
        let close = vec![
            Bbox::from_xywh(0.0, 0.0, 10.0, 10.0, 0.9, 0),
            Bbox::from_xywh(5.0, 0.0, 10.0, 10.0, 0.8, 0),
        ];
        assert_eq!(non_max_suppression(close, 0.3, true).len(), 1);

        // IoU = 0.25
        let apart = vec![
            Bbox::from_xywh(0.0, 0.0, 10.0, 10.0, 0.9, 0),
            Bbox::from_xywh(6.0, 0.0, 10.0, 10.0, 0.8, 0),
        ];
        assert_eq!(non_max_suppression(apart, 0.3, true).len(), 2);
    }

    #[test]
    fn per_class_mode_keeps_other_classes() {
        let boxes = vec![
            Bbox::from_xywh(0.0, 0.0, 50.0, 50.0, 0.9, 0),
            Bbox::from_xywh(0.0, 0.0, 50.0, 50.0, 0.8, 1),
        ];
        assert_eq!(non_max_suppression(boxes.clone(), 0.3, false).len(), 2);
        assert_eq!(non_max_suppression(boxes, 0.3, true).len(), 1);
    }

    #[test]
    fn chain_of_overlaps_is_resolved_greedily() {
        // a overlaps b, b overlaps c, a does not overlap c: a and c survive
        let a = Bbox::from_xywh(0.0, 0.0, 10.0, 10.0, 0.95, 0);
        let b = Bbox::from_xywh(4.0, 0.0, 10.0, 10.0, 0.9, 0);
        let c = Bbox::from_xywh(8.0, 0.0, 10.0, 10.0, 0.85, 0);
        let kept = non_max_suppression(vec![c, b, a], 0.3, true);
        let confs: Vec<f32> = kept.iter().map(|b| b.confidence).collect();
        assert_eq!(confs, vec![0.95, 0.85]);
    }

    #[test]
    fn survivors_never_overlap_above_threshold() {
        let mut boxes = Vec::new();
        for i in 0..20 {
            let offset = (i * 7 % 40) as f32;
            let confidence = 0.5 + i as f32 / 50.0;
            boxes.push(Bbox::from_xywh(offset, offset / 2.0, 30.0, 30.0, confidence, i % 2));
        }
        let kept = non_max_suppression(boxes, 0.3, false);
        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                if a.class_idx == b.class_idx {
                    assert!(a.iou(b) <= 0.3);
                }
            }
        }
    }

    #[test]
    fn empty_input() {
        assert!(non_max_suppression(Vec::new(), 0.3, true).is_empty());
    }
}
