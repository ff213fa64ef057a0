#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("failed to initialise ffmpeg: {0}")]
    Init(#[source] ffmpeg::Error),
    #[error("failed to open input: {0}")]
    Open(#[source] ffmpeg::Error),
    #[error("input has no video stream")]
    NoVideoStream,
    #[error("capture device: {0}")]
    Device(String),
    #[error("failed to decode video: {0}")]
    Decode(#[source] ffmpeg::Error),
    /// Decoding broke down after some frames were already handed out.
    #[error("video stream failed after {frames} frames: {source}")]
    Truncated {
        frames: u64,
        #[source]
        source: ffmpeg::Error,
    },
    /// The per-frame callback failed.
    #[error(transparent)]
    Frame(anyhow::Error),
}

impl VideoError {
    /// Whether the input itself is at fault, as opposed to the machinery around it.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            VideoError::Open(_) | VideoError::NoVideoStream | VideoError::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_input_errors_are_bad_input() {
        assert!(VideoError::NoVideoStream.is_bad_input());
        assert!(VideoError::Open(ffmpeg::Error::InvalidData).is_bad_input());
        assert!(!VideoError::Frame(anyhow::anyhow!("inference")).is_bad_input());
        assert!(!VideoError::Truncated {
            frames: 10,
            source: ffmpeg::Error::InvalidData
        }
        .is_bad_input());
    }
}
