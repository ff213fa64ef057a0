//! Video decoding through ffmpeg, and the sampled detection loop built on it.

extern crate ffmpeg_next as ffmpeg;

pub mod decode;
pub mod error;
pub mod video;

pub use decode::{DecodedFrame, FrameReader, StreamInfo};
pub use error::VideoError;
pub use video::detect_video;
