use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// The two-region screen that presents a captured image and its histogram.
///
/// Both images arrive already oriented and fitted to their regions.
pub trait HistogramView {
    /// Empties both regions, discarding anything a previous session showed.
    fn clear(&mut self) -> Result<(), DisplayError>;
    fn show_image(&mut self, image: &RgbImage) -> Result<(), DisplayError>;
    fn show_histogram(&mut self, histogram: &RgbImage) -> Result<(), DisplayError>;
}
