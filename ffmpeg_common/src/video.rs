use std::ops::ControlFlow;
use std::path::Path;

use image::DynamicImage;
use inference_common::detector::Detector;
use inference_common::frame_meta::FrameMeta;
use inference_common::frame_times::FrameTimes;
use inference_common::sampler::FrameSampler;
use inference_common::video_meta::VideoMeta;

use crate::decode::{DecodedFrame, FrameReader};
use crate::error::VideoError;

/// Sampled detection over a stream of decoded frames, fed in decode order.
pub struct SampledDetection<'a> {
    detector: &'a dyn Detector,
    sampler: FrameSampler,
    video_meta: VideoMeta,
}

impl<'a> SampledDetection<'a> {
    pub fn new(detector: &'a dyn Detector, every: u64, fps: f64) -> Self {
        Self {
            detector,
            sampler: FrameSampler::new(every, fps),
            video_meta: VideoMeta::default(),
        }
    }

    pub fn sampler(&self) -> &FrameSampler {
        &self.sampler
    }

    /// Runs the detector on `frame` if the sampler selects it, handing the
    /// result to `on_frame` before it is aggregated.
    ///
    /// Returns whether the frame was processed.
    pub fn push_frame(
        &mut self,
        frame: DecodedFrame,
        on_frame: &mut impl FnMut(&FrameMeta, &FrameTimes),
    ) -> anyhow::Result<bool> {
        self.video_meta.frames_decoded += 1;
        if !self.sampler.should_process(frame.index) {
            return Ok(false);
        }
        let mut frame_times = FrameTimes {
            decode: frame.decode,
            ..Default::default()
        };
        let timestamp = self.sampler.timestamp(frame.index);
        let image = DynamicImage::ImageRgb8(frame.image);
        let detections = self
            .detector
            .detect(&image, &mut frame_times)?
            .into_iter()
            .map(|d| d.at_frame(frame.index, timestamp))
            .collect();
        let frame_meta = FrameMeta {
            frame_number: frame.index,
            timestamp,
            detections,
        };
        on_frame(&frame_meta, &frame_times);
        self.video_meta.push(frame_meta);
        Ok(true)
    }

    pub fn finish(self) -> VideoMeta {
        self.video_meta
    }
}

/// Runs `detector` over every `every`-th frame of the video at `path`.
///
/// Blocks until the whole file is consumed. `on_frame` sees each sampled
/// frame's result, including frames without detections.
pub fn detect_video(
    path: &Path,
    detector: &dyn Detector,
    every: u64,
    mut on_frame: impl FnMut(&FrameMeta, &FrameTimes),
) -> Result<VideoMeta, VideoError> {
    let mut reader = FrameReader::open_file(path)?;
    let info = reader.info();
    let mut job = SampledDetection::new(detector, every, info.fps);

    reader.for_each_frame(|frame| {
        job.push_frame(frame, &mut on_frame)?;
        Ok(ControlFlow::Continue(()))
    })?;

    let sampler = *job.sampler();
    let video_meta = job.finish();
    log::info!(
        "Processed {} of {} frames ({}x{}, {:.2} fps, every {}) from {path:?}, {} with detections",
        video_meta.total_frames_processed,
        video_meta.frames_decoded,
        info.width,
        info.height,
        sampler.fps(),
        sampler.every(),
        video_meta.detections.len()
    );
    Ok(video_meta)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use image::{Rgb, RgbImage};
    use inference_common::detection::Detection;

    use super::*;

    /// Remembers the red value of the first pixel of every frame it sees.
    #[derive(Default)]
    struct RecordingDetector {
        seen: Mutex<Vec<u8>>,
    }

    impl Detector for RecordingDetector {
        fn detect(
            &self,
            image: &DynamicImage,
            _times: &mut FrameTimes,
        ) -> anyhow::Result<Vec<Detection>> {
            let marker = image.to_rgb8().get_pixel(0, 0)[0];
            self.seen.lock().unwrap().push(marker);
            // every other sampled frame is empty
            if marker % 10 != 0 {
                return Ok(Vec::new());
            }
            Ok(vec![Detection {
                label: "person".to_string(),
                confidence: 0.8,
                bbox: [0, 0, 4, 4],
                timestamp: None,
                frame_number: None,
                class_idx: 0,
            }])
        }

        fn name(&self) -> &str {
            "recording"
        }

        fn num_labels(&self) -> usize {
            1
        }
    }

    struct FailAfter(u64);

    impl Detector for FailAfter {
        fn detect(
            &self,
            image: &DynamicImage,
            _times: &mut FrameTimes,
        ) -> anyhow::Result<Vec<Detection>> {
            let marker = image.to_rgb8().get_pixel(0, 0)[0] as u64;
            anyhow::ensure!(marker < self.0, "forward pass failed");
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "fail-after"
        }

        fn num_labels(&self) -> usize {
            0
        }
    }

    fn frames(count: u64) -> impl Iterator<Item = DecodedFrame> {
        (0..count).map(|index| DecodedFrame {
            index,
            image: RgbImage::from_pixel(8, 8, Rgb([index as u8, 0, 0])),
            decode: Duration::from_millis(1),
        })
    }

    #[test]
    fn five_second_clip_samples_every_fifth_frame() {
        let detector = RecordingDetector::default();
        let mut job = SampledDetection::new(&detector, 5, 30.0);
        let mut reported = Vec::new();
        let mut on_frame = |frame_meta: &FrameMeta, _: &FrameTimes| {
            reported.push(frame_meta.frame_number)
        };
        for frame in frames(150) {
            job.push_frame(frame, &mut on_frame).unwrap();
        }
        let video_meta = job.finish();

        let expected: Vec<u64> = (0..150).step_by(5).collect();
        assert_eq!(reported, expected);
        let seen = detector.seen.lock().unwrap();
        let seen: Vec<u64> = seen.iter().map(|m| *m as u64).collect();
        assert_eq!(seen, expected);
        assert_eq!(video_meta.total_frames_processed, 30);
        assert_eq!(video_meta.frames_decoded, 150);
        // only frames 0, 10, 20, ... had detections
        assert_eq!(video_meta.detections.len(), 15);
        assert_eq!(video_meta.label_counts.get("person"), 15);
        let first = video_meta.detections.iter().nth(1).unwrap();
        assert_eq!(first.frame_number, 10);
        assert_eq!(first.timestamp_key(), "0.333");
        assert_eq!(first.detections[0].frame_number, Some(10));
    }

    #[test]
    fn inference_failure_stops_the_job() {
        let detector = FailAfter(20);
        let mut job = SampledDetection::new(&detector, 5, 30.0);
        let err = frames(50)
            .map(|frame| job.push_frame(frame, &mut |_, _| {}))
            .find_map(Result::err)
            .unwrap();
        assert!(err.to_string().contains("forward pass failed"));
        assert_eq!(job.finish().total_frames_processed, 4);
    }

    /// Uncompressed YUV4MPEG2 clip of flat grey frames.
    fn write_y4m(path: &Path, width: u32, height: u32, fps: u32, frames: usize) {
        let header = format!("YUV4MPEG2 W{width} H{height} F{fps}:1 Ip A1:1 C420jpeg\n");
        let mut clip = header.into_bytes();
        let plane = (width * height) as usize;
        for _ in 0..frames {
            clip.extend_from_slice(b"FRAME\n");
            clip.extend(std::iter::repeat(128u8).take(plane + plane / 2));
        }
        std::fs::write(path, clip).unwrap();
    }

    #[test]
    fn decoded_clip_is_sampled_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.y4m");
        write_y4m(&path, 16, 16, 30, 150);

        let detector = RecordingDetector::default();
        let mut reported = Vec::new();
        let video_meta = detect_video(&path, &detector, 5, |frame_meta, _| {
            reported.push(frame_meta.frame_number)
        })
        .unwrap();

        let expected: Vec<u64> = (0..150).step_by(5).collect();
        assert_eq!(reported, expected);
        assert_eq!(detector.seen.lock().unwrap().len(), 30);
        assert_eq!(video_meta.total_frames_processed, 30);
        assert_eq!(video_meta.frames_decoded, 150);
    }
}
