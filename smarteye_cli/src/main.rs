mod process_image;
mod process_live;
mod process_video;

use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use clap::Parser;
use inference_common::overlay;
use ort_common::{ModelConfig, ModelKind, OrtDetector};
use tracing_subscriber::prelude::*;

#[derive(Debug, Parser)]
pub struct Args {
    /// Path to input image (.jpg/.png) or video file (.mp4/.mkv/.avi/.mov).
    /// Use "webcam" or a device path like "/dev/video0" for live capture.
    input: PathBuf,
    /// Onnx model file to use.
    #[arg(long, short, default_value = "darknet/yolov3-tiny.onnx")]
    model: PathBuf,
    /// Model generation, selects pre- and post-processing.
    #[arg(long, default_value_t = ModelKind::Yolov3Tiny)]
    kind: ModelKind,
    /// Newline separated class names. Defaults to the built-in COCO list.
    #[arg(long)]
    labels: Option<PathBuf>,
    /// Whether to attempt to use `cuda` hw acceleration.
    /// This may silently fail and fallback to cpu acceleration presently.
    #[arg(long, action, default_value = "false")]
    cuda: bool,
    /// Minimum class score for a detection to be kept.
    #[arg(long, default_value_t = inference_common::postprocess::DEFAULT_CONFIDENCE)]
    conf: f32,
    /// Overlap above which the weaker of two boxes is dropped.
    #[arg(long, default_value_t = inference_common::postprocess::DEFAULT_NMS_IOU)]
    iou: f32,
    /// TTF font for box captions; boxes are drawn without text when unset.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Run inference on every n-th video frame.
    #[arg(long, default_value_t = inference_common::sampler::DEFAULT_SAMPLE_EVERY)]
    every: u64,
    /// Capture device used when input is "webcam".
    #[arg(long, default_value = "/dev/video0")]
    device: String,
    /// ffmpeg input format for the capture device.
    #[arg(long, default_value = "v4l2")]
    device_format: String,
    /// Overwrite this image with an annotated copy of each live frame.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Stop live capture after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

impl Args {
    fn model_config(&self) -> ModelConfig {
        ModelConfig {
            kind: self.kind,
            path: self.model.clone(),
            labels: self.labels.clone(),
            confidence_threshold: self.conf,
            nms_threshold: self.iou,
            cuda: self.cuda,
            ..ModelConfig::default()
        }
    }

    fn font(&self) -> anyhow::Result<Option<FontVec>> {
        self.font.as_deref().map(overlay::load_font).transpose()
    }
}

fn is_capture_input(input: &Path) -> bool {
    let input = input.to_string_lossy();
    input == "webcam" || input.starts_with("/dev/video")
}

fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "warn,smarteye_cli=info,ort_common=info,ffmpeg_common=info".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let detector = OrtDetector::load(&args.model_config())?;
    let font = args.font()?;

    if is_capture_input(&args.input) {
        let input = args.input.to_string_lossy();
        let device = if input == "webcam" {
            args.device.as_str()
        } else {
            input.as_ref()
        };
        let options = process_live::LiveOptions {
            device,
            format: &args.device_format,
            snapshot: args.snapshot.as_deref(),
            max_frames: args.max_frames,
        };
        process_live::process_live(&options, &detector, font.as_ref())?;
    } else {
        match args.input.extension().and_then(|os_str| os_str.to_str()) {
            Some("mp4" | "mkv" | "avi" | "mov") => {
                process_video::process_video(&args.input, &detector, args.every)?
            }
            Some("jpeg" | "jpg" | "png") => {
                process_image::process_image(&args.input, &detector, font.as_ref())?
            }
            Some(unk) => log::error!("Unhandled file extension: {unk}"),
            None => log::error!(
                "Input path does not have valid file extension: {:?}",
                args.input
            ),
        }
    }

    Ok(())
}
