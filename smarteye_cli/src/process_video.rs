use std::path::Path;

use inference_common::frame_times::AggregatedTimes;
use ort_common::OrtDetector;

/// Performs sampled inference on a video file and writes `<name>.json` next to it.
pub fn process_video(input: &Path, detector: &OrtDetector, every: u64) -> anyhow::Result<()> {
    let mut agg_times = AggregatedTimes::default();

    log::info!("Running {} on every {every}. frame of {input:?}", detector.kind());
    let video_meta = ffmpeg_common::detect_video(input, detector, every, |frame, times| {
        if !frame.detections.is_empty() {
            let summary: Vec<String> = frame
                .detections
                .iter()
                .map(|d| format!("{}({:.2})", d.label, d.confidence))
                .collect();
            println!(
                "frame {:>6} @ {:>8.3}s: {}",
                frame.frame_number,
                frame.timestamp,
                summary.join(" ")
            );
        }
        log::debug!("{times:?}");
        agg_times.push(*times);
    })?;

    let output_json_path = input.with_extension("json");
    log::info!(
        "Writing output json file, {} sampled frames: {output_json_path:?}",
        video_meta.total_frames_processed
    );
    serde_json::to_writer(std::fs::File::create(&output_json_path)?, &video_meta)?;

    for (label, count) in video_meta.label_counts.iter() {
        println!("{label}: {count}");
    }

    // Print perf stats, ignoring first (outlier) frame.
    let avg = agg_times.avg(true);
    log::info!("Average frame times: {avg:?}");

    let min = agg_times.min(true);
    log::info!("Min frame times: {min:?}");

    let max = agg_times.max(true);
    log::info!("Max frame times: {max:?}");

    Ok(())
}
