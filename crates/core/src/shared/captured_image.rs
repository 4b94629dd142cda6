use image::RgbImage;

use crate::shared::frame::Frame;

/// The one frame of a session that contained a face, converted for display.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedImage {
    image: RgbImage,
    frame_index: usize,
}

impl CapturedImage {
    pub fn new(image: RgbImage, frame_index: usize) -> Self {
        Self { image, frame_index }
    }

    /// Converts a camera frame, or `None` if its buffer is malformed.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        frame
            .to_rgb_image()
            .map(|image| Self::new(image, frame.index()))
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Position in the capture stream of the frame this image came from.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
