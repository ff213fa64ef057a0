use std::path::Path;

use anyhow::Context;
use inference_common::detector::Detector;
use inference_common::video_meta::VideoMeta;
use tracing::debug;

use crate::error::AppError;
use crate::upload::Upload;

const DEFAULT_EXTENSION: &str = "mp4";
const SCRATCH_PREFIX: &str = "smarteye-";

/// Writes the upload to a scratch directory and runs sampled detection over it.
///
/// The directory lives under `scratch_root` (the system temp dir when `None`)
/// and is removed when this returns, whether detection succeeded or not.
pub fn process_video_upload(
    detector: &dyn Detector,
    upload: &Upload,
    every: u64,
    scratch_root: Option<&Path>,
) -> Result<VideoMeta, AppError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let workdir = match scratch_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .context("creating scratch directory")?;

    let extension = upload
        .extension()
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    let path = workdir.path().join(format!("upload.{extension}"));
    std::fs::write(&path, &upload.bytes)
        .with_context(|| format!("writing upload to {path:?}"))?;
    debug!("Stored {} byte upload at {path:?}", upload.bytes.len());

    let video_meta = ffmpeg_common::detect_video(&path, detector, every, |frame, times| {
        debug!(
            "frame {} @ {:.3}s: {} detections, {times:?}",
            frame.frame_number,
            frame.timestamp,
            frame.detections.len()
        );
    })?;
    Ok(video_meta)
}
