use std::ops::ControlFlow;
use std::path::Path;
use std::time::{Duration, Instant};

use ffmpeg::format::{context, Pixel};
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{context::Context, flag::Flags};
use ffmpeg::util::frame::video::Video;
use image::RgbImage;

use crate::error::VideoError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Frames per second, `NaN` when the container doesn't say.
    pub fps: f64,
}

pub struct DecodedFrame {
    /// Position in decode order, starting at 0.
    pub index: u64,
    pub image: RgbImage,
    /// Time spent demuxing, decoding and converting this frame.
    pub decode: Duration,
}

type StepResult = Result<ControlFlow<()>, VideoError>;

/// Sequential RGB frame source over a video file or capture device.
pub struct FrameReader {
    ictx: context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: Context,
    stream_index: usize,
    info: StreamInfo,
}

fn init() -> Result<(), VideoError> {
    ffmpeg::init().map_err(VideoError::Init)
}

fn stream_fps(stream: &ffmpeg::Stream) -> f64 {
    [stream.avg_frame_rate(), stream.rate()]
        .into_iter()
        .find(|rate| rate.numerator() > 0 && rate.denominator() > 0)
        .map(f64::from)
        .unwrap_or(f64::NAN)
}

/// Copies the packed RGB24 plane row by row, dropping line padding.
fn to_rgb_image(frame: &Video) -> Option<RgbImage> {
    let (width, height) = (frame.width(), frame.height());
    let stride = frame.stride(0);
    let row = width as usize * 3;
    let data = frame.data(0);
    let mut buf = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        buf.extend_from_slice(data.get(start..start + row)?);
    }
    RgbImage::from_raw(width, height, buf)
}

impl FrameReader {
    pub fn open_file(path: &Path) -> Result<Self, VideoError> {
        init()?;
        let ictx = ffmpeg::format::input(&path).map_err(VideoError::Open)?;
        Self::from_input(ictx)
    }

    /// Opens a capture device through ffmpeg's device layer, e.g.
    /// `open_device("/dev/video0", "v4l2")`.
    pub fn open_device(device: &str, format: &str) -> Result<Self, VideoError> {
        init()?;
        ffmpeg::device::register_all();
        let input_format = ffmpeg::device::input::video()
            .find(|f| f.name().split(',').any(|name| name == format))
            .ok_or_else(|| {
                VideoError::Device(format!("no capture input format named {format:?}"))
            })?;
        let ictx = ffmpeg::format::open_with(
            &device,
            &ffmpeg::Format::Input(input_format),
            ffmpeg::Dictionary::new(),
        )
        .map_err(VideoError::Open)?
        .input();
        Self::from_input(ictx)
    }

    fn from_input(ictx: context::Input) -> Result<Self, VideoError> {
        let input = ictx
            .streams()
            .best(Type::Video)
            .ok_or(VideoError::NoVideoStream)?;
        let stream_index = input.index();
        let fps = stream_fps(&input);

        let context_decoder = ffmpeg::codec::context::Context::from_parameters(input.parameters())
            .map_err(VideoError::Decode)?;
        let decoder = context_decoder.decoder().video().map_err(VideoError::Decode)?;

        let scaler = Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            Flags::BILINEAR,
        )
        .map_err(VideoError::Decode)?;

        let info = StreamInfo {
            width: decoder.width(),
            height: decoder.height(),
            fps,
        };
        log::info!("Opened video stream #{stream_index}: {info:?}");

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            info,
        })
    }

    pub fn info(&self) -> StreamInfo {
        self.info
    }

    /// Decodes the stream to its end, handing each frame to `on_frame` in order.
    ///
    /// Stops early when `on_frame` breaks. Returns the number of frames decoded.
    pub fn for_each_frame<F>(&mut self, mut on_frame: F) -> Result<u64, VideoError>
    where
        F: FnMut(DecodedFrame) -> anyhow::Result<ControlFlow<()>>,
    {
        let Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            ..
        } = self;

        let mut frame_index = 0u64;
        let mut last = Instant::now();

        let mut receive_and_process_decoded_frames =
            |decoder: &mut ffmpeg::decoder::Video, frame_index: &mut u64| -> StepResult {
                let mut decoded = Video::empty();
                while decoder.receive_frame(&mut decoded).is_ok() {
                    let mut rgb_frame = Video::empty();
                    scaler
                        .run(&decoded, &mut rgb_frame)
                        .map_err(|e| stream_error(*frame_index, e))?;
                    let image = to_rgb_image(&rgb_frame)
                        .ok_or_else(|| stream_error(*frame_index, ffmpeg::Error::InvalidData))?;
                    let frame = DecodedFrame {
                        index: *frame_index,
                        image,
                        decode: last.elapsed(),
                    };
                    *frame_index += 1;
                    let flow = on_frame(frame).map_err(VideoError::Frame)?;
                    last = Instant::now();
                    if flow.is_break() {
                        return Ok(ControlFlow::Break(()));
                    }
                }
                Ok(ControlFlow::Continue(()))
            };

        for (stream, packet) in ictx.packets() {
            if stream.index() != *stream_index {
                continue;
            }
            decoder
                .send_packet(&packet)
                .map_err(|e| stream_error(frame_index, e))?;
            if receive_and_process_decoded_frames(&mut *decoder, &mut frame_index)?.is_break() {
                return Ok(frame_index);
            }
        }
        decoder
            .send_eof()
            .map_err(|e| stream_error(frame_index, e))?;
        receive_and_process_decoded_frames(&mut *decoder, &mut frame_index)?;

        log::debug!("Decoded {frame_index} frames");
        Ok(frame_index)
    }
}

/// Failures before the first frame mean the input is undecodable.
fn stream_error(frames: u64, source: ffmpeg::Error) -> VideoError {
    if frames == 0 {
        VideoError::Decode(source)
    } else {
        VideoError::Truncated { frames, source }
    }
}
