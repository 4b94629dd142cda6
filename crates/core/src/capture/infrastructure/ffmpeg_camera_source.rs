use crate::capture::domain::camera_device::CameraDevice;
use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::frame_source::{FrameSource, SourceInfo};
use crate::shared::frame::{Frame, PixelFormat};

/// Optional capture parameters passed to the ffmpeg device demuxer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CameraOptions {
    /// e.g. `"1280x720"`. The device default is used when unset.
    pub video_size: Option<String>,
    pub framerate: Option<u32>,
}

/// Streams frames from a camera through ffmpeg-next's device inputs
/// (`video4linux2`, `avfoundation`, `dshow`).
///
/// Every decoded frame is converted to BGRA, the fixed format the capture
/// pipeline expects from a camera.
pub struct FfmpegCameraSource {
    device: CameraDevice,
    options: CameraOptions,
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    video_stream_index: usize,
}

// Safety: FfmpegCameraSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCameraSource {}

impl FfmpegCameraSource {
    pub fn new(device: CameraDevice, options: CameraOptions) -> Self {
        Self {
            device,
            options,
            input_ctx: None,
            video_stream_index: 0,
        }
    }

    fn open_error(&self, reason: impl ToString) -> CaptureError {
        CaptureError::Open {
            url: self.device.input_url.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Looks up a registered device input format by any of its comma-separated names.
fn find_input_format(name: &str) -> Option<ffmpeg_next::format::format::Input> {
    ffmpeg_next::device::input::video()
        .find(|format| format.name().split(',').any(|alias| alias == name))
}

impl FrameSource for FfmpegCameraSource {
    fn open(&mut self) -> Result<SourceInfo, CaptureError> {
        ffmpeg_next::init().map_err(|e| self.open_error(e))?;
        ffmpeg_next::device::register_all();

        let format = find_input_format(&self.device.input_format).ok_or_else(|| {
            self.open_error(format!(
                "input format '{}' is not available in this ffmpeg build",
                self.device.input_format
            ))
        })?;

        let mut options = ffmpeg_next::Dictionary::new();
        if let Some(size) = &self.options.video_size {
            options.set("video_size", size);
        }
        if let Some(rate) = self.options.framerate {
            options.set("framerate", &rate.to_string());
        }

        let ctx = ffmpeg_next::format::open_with(
            &self.device.input_url,
            &ffmpeg_next::format::format::Format::Input(format),
            options,
        )
        .map_err(|e| self.open_error(e))?;
        let ictx = match ctx {
            ffmpeg_next::format::context::Context::Input(ictx) => ictx,
            ffmpeg_next::format::context::Context::Output(_) => {
                return Err(self.open_error("device opened as an output"))
            }
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| self.open_error("no video stream"))?;
        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| self.open_error(e))?;
        let decoder = codec_ctx.decoder().video().map_err(|e| self.open_error(e))?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let info = SourceInfo {
            name: self.device.name.clone(),
            width: decoder.width(),
            height: decoder.height(),
            fps,
        };

        self.video_stream_index = video_stream_index;
        self.input_ctx = Some(ictx);
        log::info!(
            "Opened camera {} ({}x{} @ {:.1} fps)",
            info.name,
            info.width,
            info.height,
            info.fps
        );
        Ok(info)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, CaptureError>> + '_> {
        let video_stream_index = self.video_stream_index;
        let Some(ictx) = self.input_ctx.as_mut() else {
            return Box::new(std::iter::once(Err(CaptureError::NotOpened)));
        };

        match build_decoder(ictx, video_stream_index) {
            Ok((decoder, scaler)) => {
                let width = decoder.width();
                let height = decoder.height();
                Box::new(CameraFrameIter {
                    ictx,
                    decoder,
                    scaler,
                    width,
                    height,
                    video_stream_index,
                    frame_index: 0,
                    done: false,
                })
            }
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        if self.input_ctx.take().is_some() {
            log::debug!("Closed camera {}", self.device.name);
        }
    }
}

fn build_decoder(
    ictx: &ffmpeg_next::format::context::Input,
    video_stream_index: usize,
) -> Result<
    (
        ffmpeg_next::decoder::Video,
        ffmpeg_next::software::scaling::Context,
    ),
    CaptureError,
> {
    let decode_err = |e: ffmpeg_next::Error| CaptureError::Decode(e.to_string());

    let stream = ictx
        .stream(video_stream_index)
        .ok_or_else(|| CaptureError::Decode("video stream disappeared".into()))?;
    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .map_err(decode_err)?;
    let decoder = codec_ctx.decoder().video().map_err(decode_err)?;

    let scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg_next::format::Pixel::BGRA,
        decoder.width(),
        decoder.height(),
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .map_err(decode_err)?;

    Ok((decoder, scaler))
}

/// Lazy iterator that pulls one camera frame per call.
struct CameraFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    frame_index: usize,
    done: bool,
}

impl CameraFrameIter<'_> {
    fn try_receive(&mut self) -> Option<Result<Frame, CaptureError>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let mut bgra = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut bgra) {
            return Some(Err(CaptureError::Decode(e.to_string())));
        }

        let pixels = extract_bgra_pixels(&bgra, self.width, self.height);
        let frame = Frame::new(
            pixels,
            self.width,
            self.height,
            PixelFormat::Bgra32,
            self.frame_index,
        );
        self.frame_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for CameraFrameIter<'_> {
    type Item = Result<Frame, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                // Device went away: drain what the decoder still holds.
                let _ = self.decoder.send_eof();
                self.done = true;
                return self.try_receive();
            };

            if stream.index() != self.video_stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                return Some(Err(CaptureError::Decode(e.to_string())));
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies pixel data from an ffmpeg BGRA frame into a contiguous buffer.
///
/// ffmpeg frames may pad each row (stride > width*4); the padding is dropped.
fn extract_bgra_pixels(
    frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    copy_rows(frame.data(0), frame.stride(0), width as usize * 4, height as usize)
}

fn copy_rows(data: &[u8], stride: usize, row_bytes: usize, rows: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
