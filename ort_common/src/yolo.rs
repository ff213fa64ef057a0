//! Pre- and post-processing for the two YOLO generations the service can run.
//!
//! Both expect an RGB, NCHW, `[0, 1]` scaled input and emit rows of
//! `[cx, cy, w, h, objectness, class scores...]`. They differ in how the
//! frame is fitted into the network input and in what the row geometry is
//! relative to.

use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use inference_common::bbox::Bbox;
use inference_common::detection::BoxFormat;
use inference_common::img_dimensions::ImgDimensions;
use ndarray::Array4;
use serde::{Deserialize, Serialize};

/// Leading geometry + objectness columns of every output row.
const ROW_PREFIX: usize = 5;
const LETTERBOX_FILL: f32 = 114.0 / 255.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Darknet YOLOv3-tiny exported to onnx.
    #[default]
    Yolov3Tiny,
    /// Pretrained YOLOv5 nano.
    Yolov5n,
}

impl ModelKind {
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Yolov3Tiny => "yolov3-tiny",
            ModelKind::Yolov5n => "yolov5n",
        }
    }

    pub fn default_input_size(self) -> u32 {
        match self {
            ModelKind::Yolov3Tiny => 416,
            ModelKind::Yolov5n => 640,
        }
    }

    pub fn box_format(self) -> BoxFormat {
        match self {
            ModelKind::Yolov3Tiny => BoxFormat::Xywh,
            ModelKind::Yolov5n => BoxFormat::Xyxy,
        }
    }

    /// Darknet deployments suppressed across classes, yolov5 per class.
    pub fn default_class_agnostic(self) -> bool {
        matches!(self, ModelKind::Yolov3Tiny)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yolov3-tiny" | "yolov3tiny" | "v3" => Ok(ModelKind::Yolov3Tiny),
            "yolov5n" | "yolov5" | "v5" => Ok(ModelKind::Yolov5n),
            other => Err(format!("unknown model kind: {other}")),
        }
    }
}

/// How a frame was mapped onto the network input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Resized to the input without keeping aspect ratio.
    Stretch,
    /// Resized by `scale`, then padded by `pad_w`/`pad_h` on the leading edges.
    Letterbox { scale: f32, pad_w: f32, pad_h: f32 },
}

pub struct Preprocessed {
    pub tensor: Array4<f32>,
    pub transform: Transform,
    pub frame: ImgDimensions,
}

pub fn preprocess(kind: ModelKind, image: &DynamicImage, input_size: u32) -> Preprocessed {
    let rgb = image.to_rgb8();
    let frame = ImgDimensions::of(&rgb);
    let (tensor, transform) = match kind {
        ModelKind::Yolov3Tiny => (stretch(&rgb, input_size), Transform::Stretch),
        ModelKind::Yolov5n => letterbox(&rgb, input_size),
    };
    Preprocessed {
        tensor,
        transform,
        frame,
    }
}

fn stretch(rgb: &RgbImage, size: u32) -> Array4<f32> {
    let resized = imageops::resize(rgb, size, size, FilterType::Triangle);
    let mut tensor = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
    write_pixels(&mut tensor, &resized, 0, 0);
    tensor
}

fn letterbox(rgb: &RgbImage, size: u32) -> (Array4<f32>, Transform) {
    let (w0, h0) = rgb.dimensions();
    let scale = (size as f32 / w0 as f32).min(size as f32 / h0 as f32);
    let new_w = ((w0 as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((h0 as f32 * scale).round() as u32).clamp(1, size);
    let pad_w = (size - new_w) / 2;
    let pad_h = (size - new_h) / 2;

    let resized = imageops::resize(rgb, new_w, new_h, FilterType::Triangle);
    let mut tensor = Array4::<f32>::from_elem((1, 3, size as usize, size as usize), LETTERBOX_FILL);
    write_pixels(&mut tensor, &resized, pad_w as usize, pad_h as usize);

    let transform = Transform::Letterbox {
        scale,
        pad_w: pad_w as f32,
        pad_h: pad_h as f32,
    };
    (tensor, transform)
}

fn write_pixels(tensor: &mut Array4<f32>, image: &RgbImage, x0: usize, y0: usize) {
    for (x, y, px) in image.enumerate_pixels() {
        let (x, y) = (x0 + x as usize, y0 + y as usize);
        for c in 0..3 {
            tensor[[0, c, y, x]] = px[c] as f32 / 255.0;
        }
    }
}

/// First index of the highest score, like numpy's argmax.
fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((idx, score)),
        })
}

fn rows(data: &[f32], row_len: usize) -> anyhow::Result<std::slice::ChunksExact<'_, f32>> {
    anyhow::ensure!(
        row_len > ROW_PREFIX,
        "output rows have {row_len} values, expected at least {}",
        ROW_PREFIX + 1
    );
    Ok(data.chunks_exact(row_len))
}

/// Decodes Darknet-style rows whose geometry is relative to the frame.
///
/// The score is the best class score alone. Centre and size are truncated
/// to whole pixels first, then the corner is `trunc(cx - w / 2)`.
pub fn decode_darknet(
    data: &[f32],
    row_len: usize,
    frame: ImgDimensions,
    min_confidence: f32,
) -> anyhow::Result<Vec<Bbox>> {
    let mut boxes = Vec::new();
    for row in rows(data, row_len)? {
        let Some((class_idx, score)) = argmax(&row[ROW_PREFIX..]) else {
            continue;
        };
        if score <= min_confidence {
            continue;
        }
        let cx = (row[0] * frame.width).trunc();
        let cy = (row[1] * frame.height).trunc();
        let w = (row[2] * frame.width).trunc();
        let h = (row[3] * frame.height).trunc();
        let x = (cx - w / 2.0).trunc();
        let y = (cy - h / 2.0).trunc();
        boxes.push(Bbox::from_xywh(x, y, w, h, score, class_idx));
    }
    Ok(boxes)
}

/// Decodes yolov5 rows whose geometry is in letterboxed network pixels.
///
/// The score is objectness times the best class score; boxes are mapped back
/// to the frame and clipped to it.
pub fn decode_yolov5(
    data: &[f32],
    row_len: usize,
    transform: Transform,
    frame: ImgDimensions,
    min_confidence: f32,
) -> anyhow::Result<Vec<Bbox>> {
    let (scale, pad_w, pad_h) = match transform {
        Transform::Letterbox { scale, pad_w, pad_h } => (scale, pad_w, pad_h),
        Transform::Stretch => anyhow::bail!("yolov5 output expects a letterboxed input"),
    };
    let mut boxes = Vec::new();
    for row in rows(data, row_len)? {
        let objectness = row[4];
        if objectness <= min_confidence {
            continue;
        }
        let Some((class_idx, class_score)) = argmax(&row[ROW_PREFIX..]) else {
            continue;
        };
        let score = objectness * class_score;
        if score <= min_confidence {
            continue;
        }
        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let unpad = |v: f32, pad: f32| (v - pad) / scale;
        let bbox = Bbox::new(
            unpad(cx - w / 2.0, pad_w),
            unpad(cy - h / 2.0, pad_h),
            unpad(cx + w / 2.0, pad_w),
            unpad(cy + h / 2.0, pad_h),
            score,
            class_idx,
        )
        .clip(frame.width, frame.height);
        boxes.push(bbox);
    }
    Ok(boxes)
}

/// Decodes one output tensor of `kind` into candidate boxes above `min_confidence`.
pub fn decode(
    kind: ModelKind,
    data: &[f32],
    row_len: usize,
    prep: &Preprocessed,
    min_confidence: f32,
) -> anyhow::Result<Vec<Bbox>> {
    match kind {
        ModelKind::Yolov3Tiny => decode_darknet(data, row_len, prep.frame, min_confidence),
        ModelKind::Yolov5n => {
            decode_yolov5(data, row_len, prep.transform, prep.frame, min_confidence)
        }
    }
}
