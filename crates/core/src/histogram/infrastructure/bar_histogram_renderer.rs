/// Renders an intensity histogram as a bar chart.
///
/// One bar per luma level, drawn in that level's own gray on a black
/// background. Very dark levels are lifted to a minimum gray so their bars
/// stay visible.
use image::{Rgb, RgbImage};

use crate::histogram::domain::histogram_generator::{HistogramError, HistogramGenerator};
use crate::histogram::domain::intensity_histogram::IntensityHistogram;
use crate::shared::constants::HISTOGRAM_BINS;

pub const DEFAULT_CANVAS_WIDTH: u32 = 512;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 400;

/// Lowest gray used for a bar.
const MIN_BAR_GRAY: u8 = 48;

pub struct BarHistogramRenderer {
    width: u32,
    height: u32,
}

impl BarHistogramRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for BarHistogramRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl HistogramGenerator for BarHistogramRenderer {
    fn generate(&self, image: &RgbImage) -> Result<RgbImage, HistogramError> {
        if self.width < HISTOGRAM_BINS as u32 || self.height == 0 {
            return Err(HistogramError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(HistogramError::EmptyImage);
        }

        let histogram = IntensityHistogram::from_rgb(image);
        let heights = histogram.normalized(self.height);
        let bar_width = self.width / HISTOGRAM_BINS as u32;
        // Leftover columns are split evenly on both sides
        let x_offset = (self.width - bar_width * HISTOGRAM_BINS as u32) / 2;

        let mut canvas = RgbImage::from_pixel(self.width, self.height, Rgb([0, 0, 0]));
        for (level, &bar_height) in heights.iter().enumerate() {
            let gray = (level as u8).max(MIN_BAR_GRAY);
            let x0 = x_offset + level as u32 * bar_width;
            for x in x0..x0 + bar_width {
                for y in (self.height - bar_height)..self.height {
                    canvas.put_pixel(x, y, Rgb([gray, gray, gray]));
                }
            }
        }

        log::debug!(
            "rendered histogram of {} pixels, mean luma {:.1}",
            histogram.total(),
            histogram.mean().unwrap_or(0.0)
        );
        Ok(canvas)
    }
}
