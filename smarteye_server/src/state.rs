use std::path::PathBuf;
use std::sync::Arc;

use inference_common::detector::Detector;

/// Shared by every request. The detector is loaded once at startup.
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<dyn Detector>,
    pub sample_every: u64,
    /// Parent of the per-upload scratch directories; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(detector: Arc<dyn Detector>, sample_every: u64) -> Self {
        Self {
            detector,
            sample_every,
            scratch_dir: None,
        }
    }

    pub fn with_scratch_dir(mut self, scratch_dir: Option<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir;
        self
    }
}
