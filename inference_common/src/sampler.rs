/// Fallback when a stream doesn't report a usable frame rate.
pub const DEFAULT_FPS: f64 = 30.0;
pub const DEFAULT_SAMPLE_EVERY: u64 = 5;

/// Picks which decoded frames of a video are run through the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSampler {
    every: u64,
    fps: f64,
}

impl FrameSampler {
    /// `every` below 1 is treated as 1, a non-positive `fps` as [`DEFAULT_FPS`].
    pub fn new(every: u64, fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            log::warn!("Invalid frame rate {fps}, assuming {DEFAULT_FPS}");
            DEFAULT_FPS
        };
        Self {
            every: every.max(1),
            fps,
        }
    }

    pub fn every(&self) -> u64 {
        self.every
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn should_process(&self, frame_number: u64) -> bool {
        frame_number % self.every == 0
    }

    /// Seconds from the start of the stream.
    pub fn timestamp(&self, frame_number: u64) -> f64 {
        frame_number as f64 / self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_multiples_are_sampled() {
        let sampler = FrameSampler::new(5, 30.0);
        let sampled: Vec<u64> = (0..150).filter(|n| sampler.should_process(*n)).collect();
        assert_eq!(sampled.len(), 30);
        assert!(sampled.iter().all(|n| n % 5 == 0));
    }

    #[test]
    fn timestamp_is_frame_over_fps() {
        let sampler = FrameSampler::new(5, 30.0);
        assert_eq!(sampler.timestamp(0), 0.0);
        assert!((sampler.timestamp(15) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn degenerate_parameters_are_corrected() {
        let sampler = FrameSampler::new(0, 0.0);
        assert_eq!(sampler.every(), 1);
        assert_eq!(sampler.fps(), DEFAULT_FPS);
        assert!(sampler.should_process(3));
    }
}
