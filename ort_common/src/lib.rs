//! ONNX Runtime backed detectors for the Darknet-derived YOLOv3-tiny and YOLOv5 nano models.

pub mod detector;
pub mod error;
pub mod session;
pub mod yolo;

pub use detector::{ModelConfig, OrtDetector};
pub use error::ModelLoadError;
pub use yolo::ModelKind;
