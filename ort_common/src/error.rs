use std::path::PathBuf;

use inference_common::coco_classes::LabelsError;

/// Failures while loading the process-wide model context. These are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model file {0:?} does not exist")]
    MissingModel(PathBuf),
    #[error(transparent)]
    Labels(#[from] LabelsError),
    #[error("failed to build onnx runtime session: {0}")]
    Session(#[source] anyhow::Error),
}
