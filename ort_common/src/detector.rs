use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, anyhow};
use image::DynamicImage;
use inference_common::coco_classes::Labels;
use inference_common::detection::{BoxFormat, Detection};
use inference_common::detector::Detector;
use inference_common::frame_times::FrameTimes;
use inference_common::palette::Palette;
use inference_common::postprocess::{self, Thresholds};
use ndarray::CowArray;
use ort::session::Session;
use ort::value::TensorRef;
use serde::{Deserialize, Serialize};

use crate::error::ModelLoadError;
use crate::session;
use crate::yolo::{self, ModelKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// Onnx graph + weights.
    pub path: PathBuf,
    /// Newline separated class names; the built-in COCO list when unset.
    pub labels: Option<PathBuf>,
    /// Square network input side; the model generation's default when unset.
    pub input_size: Option<u32>,
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    /// Suppress across classes; the model generation's default when unset.
    pub agnostic_nms: Option<bool>,
    pub cuda: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::default(),
            path: PathBuf::from("darknet/yolov3-tiny.onnx"),
            labels: Some(PathBuf::from("darknet/data/coco.names")),
            input_size: None,
            confidence_threshold: postprocess::DEFAULT_CONFIDENCE,
            nms_threshold: postprocess::DEFAULT_NMS_IOU,
            agnostic_nms: None,
            cuda: false,
        }
    }
}

impl ModelConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            confidence: self.confidence_threshold,
            nms_iou: self.nms_threshold,
            class_agnostic: self
                .agnostic_nms
                .unwrap_or_else(|| self.kind.default_class_agnostic()),
        }
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
            .unwrap_or_else(|| self.kind.default_input_size())
    }
}

/// A loaded model with its labels, colours and thresholds.
///
/// Everything but the session is read-only after construction; ort needs
/// exclusive access for a forward pass, so the session sits behind a mutex.
pub struct OrtDetector {
    session: Mutex<Session>,
    kind: ModelKind,
    input_size: u32,
    thresholds: Thresholds,
    labels: Labels,
    palette: Palette,
}

impl OrtDetector {
    pub fn load(config: &ModelConfig) -> Result<Self, ModelLoadError> {
        if !config.path.is_file() {
            return Err(ModelLoadError::MissingModel(config.path.clone()));
        }
        let labels = match &config.labels {
            Some(path) => Labels::from_file(path)?,
            None => Labels::coco(),
        };
        let palette = Palette::new(labels.len());

        let ep_name = session::init_runtime(config.cuda).map_err(ModelLoadError::Session)?;
        let session = session::load_session(&config.path).map_err(ModelLoadError::Session)?;
        log::info!(
            "Prepared ort {ep_name} session with {} model: {:?}",
            config.kind,
            config.path
        );

        Ok(Self {
            session: Mutex::new(session),
            kind: config.kind,
            input_size: config.input_size(),
            thresholds: config.thresholds(),
            labels,
            palette,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn box_format(&self) -> BoxFormat {
        self.kind.box_format()
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}

impl Detector for OrtDetector {
    fn detect(
        &self,
        image: &DynamicImage,
        times: &mut FrameTimes,
    ) -> anyhow::Result<Vec<Detection>> {
        let start = Instant::now();
        let prep = yolo::preprocess(self.kind, image, self.input_size);
        times.pre_processing = start.elapsed();

        let start = Instant::now();
        let mut candidates = Vec::new();
        {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("ort session lock poisoned"))?;
            let input = CowArray::from(prep.tensor.view()).into_dyn();
            let outputs = session.run(ort::inputs![TensorRef::from_array_view(&input)?])?;
            times.forward_pass = start.elapsed();

            // Darknet graphs expose one output per detection scale.
            for idx in 0..outputs.len() {
                let (shape, data) = outputs[idx].try_extract_tensor::<f32>()?;
                let row_len = *shape.last().context("output tensor has no dimensions")? as usize;
                candidates.extend(yolo::decode(
                    self.kind,
                    data,
                    row_len,
                    &prep,
                    self.thresholds.confidence,
                )?);
            }
        }

        let start = Instant::now();
        let detections = postprocess::to_detections(
            candidates,
            &self.thresholds,
            &self.labels,
            self.kind.box_format(),
        );
        times.post_processing = start.elapsed();
        log::debug!("{} detections, {times:?}", detections.len());
        Ok(detections)
    }

    fn name(&self) -> &str {
        self.kind.name()
    }

    fn num_labels(&self) -> usize {
        self.labels.len()
    }
}
