use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ab_glyph::FontVec;
use anyhow::Context;
use ffmpeg_common::FrameReader;
use image::DynamicImage;
use inference_common::detection::Detection;
use inference_common::detector::Detector;
use inference_common::frame_times::{AggregatedTimes, FrameTimes};
use inference_common::overlay;
use ort_common::OrtDetector;

pub struct LiveOptions<'a> {
    pub device: &'a str,
    pub format: &'a str,
    pub snapshot: Option<&'a Path>,
    pub max_frames: Option<u64>,
}

/// `HH:MM:SS - 2 objects: person(0.87) dog(0.61)`
fn summary_line(clock: &str, detections: &[Detection]) -> String {
    let objects: Vec<String> = detections
        .iter()
        .map(|d| format!("{}({:.2})", d.label, d.confidence))
        .collect();
    let mut line = format!("{clock} - {} objects", detections.len());
    if !objects.is_empty() {
        line.push_str(": ");
        line.push_str(&objects.join(" "));
    }
    line
}

/// Performs inference on every frame of a capture device until interrupted.
pub fn process_live(
    options: &LiveOptions,
    detector: &OrtDetector,
    font: Option<&FontVec>,
) -> anyhow::Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .context("installing Ctrl-C handler")?;

    log::info!(
        "Starting live inference from device: {} ({})",
        options.device,
        options.format
    );
    let mut reader = FrameReader::open_device(options.device, options.format)?;
    let info = reader.info();
    log::info!("Capturing {}x{} @ {:.1} fps", info.width, info.height, info.fps);

    let mut agg_times = AggregatedTimes::default();
    let frames = reader.for_each_frame(|frame| {
        if !running.load(Ordering::SeqCst) {
            log::info!("Interrupted, stopping capture");
            return Ok(ControlFlow::Break(()));
        }

        let mut frame_times = FrameTimes {
            decode: frame.decode,
            ..Default::default()
        };
        let image = DynamicImage::ImageRgb8(frame.image);
        let detections = detector.detect(&image, &mut frame_times)?;

        let clock = chrono::Local::now().format("%H:%M:%S").to_string();
        println!("{}", summary_line(&clock, &detections));

        if let Some(snapshot) = options.snapshot {
            let mut annotated = image.into_rgb8();
            overlay::draw_detections(
                &mut annotated,
                &detections,
                detector.box_format(),
                detector.palette(),
                font,
            );
            annotated
                .save(snapshot)
                .with_context(|| format!("writing snapshot {snapshot:?}"))?;
        }

        log::debug!("{frame_times:?}");
        agg_times.push(frame_times);

        let done = options.max_frames.is_some_and(|max| frame.index + 1 >= max);
        Ok(if done {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        })
    })?;

    log::info!("Captured {frames} frames");
    if !agg_times.is_empty() {
        log::info!("Average frame times: {:?}", agg_times.avg(true));
        log::info!("Max frame times: {:?}", agg_times.max(true));
    }

    Ok(())
}
