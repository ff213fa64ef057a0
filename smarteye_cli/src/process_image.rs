use std::path::Path;

use ab_glyph::FontVec;
use image::GenericImageView;
use inference_common::detection::LabelCounts;
use inference_common::detector::Detector;
use inference_common::frame_times::FrameTimes;
use inference_common::overlay;
use ort_common::OrtDetector;
use serde_json::json;

/// Performs inference on a single image file.
pub fn process_image(
    path: &Path,
    detector: &OrtDetector,
    font: Option<&FontVec>,
) -> anyhow::Result<()> {
    let mut frame_times = FrameTimes::default();

    // Read image.
    let og_image = image::open(path)?;
    let (img_width, img_height) = og_image.dimensions();

    let detections = detector.detect(&og_image, &mut frame_times)?;
    let label_counts = LabelCounts::from_detections(&detections);

    println!("\nDetections in {path:?} ({img_width}x{img_height}):");
    for detection in &detections {
        println!(
            "  {:>14} {:.4} {:?} (class {})",
            detection.label, detection.confidence, detection.bbox, detection.class_idx
        );
    }
    for (label, count) in label_counts.iter() {
        println!("  {label}: {count}");
    }

    // NB! For a single image, ort times will be misleading,
    // as the first time it's used, it does all kinds of lazy init.
    log::debug!("{frame_times:?}");

    // Save output: image & detections.
    let mut img = og_image.to_rgb8();
    overlay::draw_detections(
        &mut img,
        &detections,
        detector.box_format(),
        detector.palette(),
        font,
    );
    let img_output_path = path.with_extension("out.jpg");
    img.save(&img_output_path)?;

    let json_output_path = path.with_extension("out.json");
    let output = json!({
        "detected_objects": detections,
        "label_counts": label_counts,
    });
    serde_json::to_writer(std::fs::File::create(&json_output_path)?, &output)?;
    log::info!("Wrote {img_output_path:?} and {json_output_path:?}");

    Ok(())
}
