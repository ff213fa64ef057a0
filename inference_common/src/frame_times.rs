use std::time::Duration;

/// Wall-clock cost of the stages of one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameTimes {
    pub decode: Duration,
    pub pre_processing: Duration,
    pub forward_pass: Duration,
    pub post_processing: Duration,
}

impl FrameTimes {
    pub fn total(&self) -> Duration {
        self.decode + self.pre_processing + self.forward_pass + self.post_processing
    }

    fn zip_with(&self, other: &Self, f: impl Fn(Duration, Duration) -> Duration) -> Self {
        Self {
            decode: f(self.decode, other.decode),
            pre_processing: f(self.pre_processing, other.pre_processing),
            forward_pass: f(self.forward_pass, other.forward_pass),
            post_processing: f(self.post_processing, other.post_processing),
        }
    }
}

#[derive(Debug, Default)]
pub struct AggregatedTimes(Vec<FrameTimes>);

impl AggregatedTimes {
    pub fn push(&mut self, times: FrameTimes) {
        self.0.push(times);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // The first frame pays for ort's lazy initialisation.
    fn samples(&self, skip_first: bool) -> &[FrameTimes] {
        if skip_first && self.0.len() > 1 {
            &self.0[1..]
        } else {
            &self.0
        }
    }

    pub fn avg(&self, skip_first: bool) -> FrameTimes {
        let samples = self.samples(skip_first);
        if samples.is_empty() {
            return FrameTimes::default();
        }
        let n = samples.len() as u32;
        let sum = samples
            .iter()
            .fold(FrameTimes::default(), |acc, t| acc.zip_with(t, |a, b| a + b));
        sum.zip_with(&sum, |a, _| a / n)
    }

    pub fn min(&self, skip_first: bool) -> FrameTimes {
        self.fold(skip_first, Duration::min)
    }

    pub fn max(&self, skip_first: bool) -> FrameTimes {
        self.fold(skip_first, Duration::max)
    }

    fn fold(&self, skip_first: bool, f: fn(Duration, Duration) -> Duration) -> FrameTimes {
        let samples = self.samples(skip_first);
        let Some(first) = samples.first() else {
            return FrameTimes::default();
        };
        samples.iter().skip(1).fold(*first, |acc, t| acc.zip_with(t, f))
    }
}
