use image::DynamicImage;

use crate::detection::Detection;
use crate::frame_times::FrameTimes;

/// Runs one frame through a model and returns the filtered detections.
///
/// Implementations are shared across request handlers, so any state they
/// mutate during a forward pass must be synchronised internally.
pub trait Detector: Send + Sync {
    fn detect(
        &self,
        image: &DynamicImage,
        times: &mut FrameTimes,
    ) -> anyhow::Result<Vec<Detection>>;

    /// Short model name for logs and health output.
    fn name(&self) -> &str;

    fn num_labels(&self) -> usize;
}
