use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HistogramError {
    #[error("cannot build a histogram from an empty image")]
    EmptyImage,
    #[error("histogram canvas {width}x{height} is too small")]
    InvalidCanvas { width: u32, height: u32 },
}

/// Domain interface for turning a still image into a histogram picture.
pub trait HistogramGenerator: Send + Sync {
    fn generate(&self, image: &RgbImage) -> Result<RgbImage, HistogramError>;
}
