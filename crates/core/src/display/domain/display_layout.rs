//! Geometry of the histogram screen: an image region on top, a histogram
//! region below it, both inset by the same padding.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::shared::constants::{
    DEFAULT_DISPLAY_WIDTH, DISPLAY_PADDING, HISTOGRAM_REGION_HEIGHT, IMAGE_REGION_HEIGHT,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayLayout {
    /// Width of both regions, padding excluded.
    pub width: u32,
    pub padding: u32,
    pub image_height: u32,
    pub histogram_height: u32,
}

impl Default for DisplayLayout {
    fn default() -> Self {
        Self::with_width(DEFAULT_DISPLAY_WIDTH)
    }
}

impl DisplayLayout {
    pub fn with_width(width: u32) -> Self {
        Self {
            width,
            padding: DISPLAY_PADDING,
            image_height: IMAGE_REGION_HEIGHT,
            histogram_height: HISTOGRAM_REGION_HEIGHT,
        }
    }

    pub fn image_region(&self) -> DisplayRegion {
        DisplayRegion {
            x: self.padding,
            y: self.padding,
            width: self.width,
            height: self.image_height,
        }
    }

    pub fn histogram_region(&self) -> DisplayRegion {
        DisplayRegion {
            x: self.padding,
            y: 2 * self.padding + self.image_height,
            width: self.width,
            height: self.histogram_height,
        }
    }
}

/// Largest size with the aspect ratio of `size` that fits in `bounds`.
///
/// Never returns a zero dimension for a non-empty input.
pub fn fit_within(size: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = size;
    let (bw, bh) = bounds;
    if w == 0 || h == 0 || bw == 0 || bh == 0 {
        return (0, 0);
    }
    let scale = (bw as f64 / w as f64).min(bh as f64 / h as f64);
    let fw = ((w as f64 * scale).round() as u32).clamp(1, bw);
    let fh = ((h as f64 * scale).round() as u32).clamp(1, bh);
    (fw, fh)
}

/// Resizes `image` to aspect-fit inside `region`.
pub fn fit_to_region(image: &RgbImage, region: &DisplayRegion) -> RgbImage {
    let target = fit_within(image.dimensions(), (region.width, region.height));
    if target == image.dimensions() || target.0 == 0 {
        return image.clone();
    }
    imageops::resize(image, target.0, target.1, FilterType::Triangle)
}

/// Quarter turn clockwise, undoing the sideways camera buffer.
pub fn rotate_for_display(image: &RgbImage) -> RgbImage {
    imageops::rotate90(image)
}
