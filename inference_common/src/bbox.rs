use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel coordinates, with the score and class it was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub confidence: f32,
    pub class_idx: usize,
}

impl Bbox {
    pub fn new(
        xmin: f32,
        ymin: f32,
        xmax: f32,
        ymax: f32,
        confidence: f32,
        class_idx: usize,
    ) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            confidence,
            class_idx,
        }
    }

    /// Builds a box from its top-left corner and size.
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32, confidence: f32, class_idx: usize) -> Self {
        Self::new(x, y, x + w, y + h, confidence, class_idx)
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection-over-union with another box. Degenerate boxes overlap nothing.
    pub fn iou(&self, other: &Bbox) -> f32 {
        let inter_w = (self.xmax.min(other.xmax) - self.xmin.max(other.xmin)).max(0.0);
        let inter_h = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        let inter = inter_w * inter_h;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 || !union.is_finite() {
            return 0.0;
        }
        inter / union
    }

    /// Clips the box to `[0, width] x [0, height]`.
    pub fn clip(self, width: f32, height: f32) -> Self {
        Self {
            xmin: self.xmin.clamp(0.0, width),
            ymin: self.ymin.clamp(0.0, height),
            xmax: self.xmax.clamp(0.0, width),
            ymax: self.ymax.clamp(0.0, height),
            ..self
        }
    }
}
