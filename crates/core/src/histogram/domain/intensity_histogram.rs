//! Per-pixel brightness distribution of an RGB image.

use image::RgbImage;

use crate::shared::constants::HISTOGRAM_BINS;

/// BT.601 luma, rounded to the nearest level.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Pixel counts for each of the 256 luma levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntensityHistogram {
    bins: [u64; HISTOGRAM_BINS],
}

impl IntensityHistogram {
    pub fn from_rgb(image: &RgbImage) -> Self {
        let mut bins = [0u64; HISTOGRAM_BINS];
        for px in image.pixels() {
            let [r, g, b] = px.0;
            bins[luma(r, g, b) as usize] += 1;
        }
        Self { bins }
    }

    pub fn bins(&self) -> &[u64; HISTOGRAM_BINS] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.bins.iter().copied().max().unwrap_or(0)
    }

    /// Mean luma, or `None` for an empty histogram.
    pub fn mean(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let weighted: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(level, &count)| level as f64 * count as f64)
            .sum();
        Some(weighted / total as f64)
    }

    /// Bin counts scaled so the tallest bin equals `height`.
    ///
    /// Non-empty bins are at least 1 so they stay visible.
    pub fn normalized(&self, height: u32) -> Vec<u32> {
        let max = self.max_count();
        if max == 0 {
            return vec![0; HISTOGRAM_BINS];
        }
        self.bins
            .iter()
            .map(|&count| {
                if count == 0 {
                    0
                } else {
                    let scaled = (count as f64 / max as f64 * height as f64).round() as u32;
                    scaled.max(1)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;
    use rstest::rstest;

    #[rstest]
    #[case::black([0, 0, 0], 0)]
    #[case::white([255, 255, 255], 255)]
    #[case::red([255, 0, 0], 76)]
    #[case::green([0, 255, 0], 150)]
    #[case::blue([0, 0, 255], 29)]
    #[case::gray([128, 128, 128], 128)]
    fn test_luma_bt601(#[case] rgb: [u8; 3], #[case] expected: u8) {
        assert_eq!(luma(rgb[0], rgb[1], rgb[2]), expected);
    }

    #[test]
    fn test_uniform_image_has_single_bin() {
        let image = RgbImage::from_pixel(10, 4, Rgb([0, 255, 0]));
        let hist = IntensityHistogram::from_rgb(&image);

        assert_eq!(hist.total(), 40);
        assert_eq!(hist.bins()[150], 40);
        assert_eq!(hist.bins().iter().filter(|&&c| c > 0).count(), 1);
        assert_eq!(hist.max_count(), 40);
    }

    #[test]
    fn test_mean_of_two_levels() {
        let mut image = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        image.put_pixel(1, 0, Rgb([200, 200, 200]));
        let hist = IntensityHistogram::from_rgb(&image);
        assert_relative_eq!(hist.mean().unwrap(), 100.0);
    }

    #[test]
    fn test_empty_image() {
        let hist = IntensityHistogram::from_rgb(&RgbImage::new(0, 0));
        assert_eq!(hist.total(), 0);
        assert!(hist.mean().is_none());
        assert!(hist.normalized(100).iter().all(|&h| h == 0));
    }

    #[test]
    fn test_normalized_scales_to_height_and_keeps_small_bins() {
        // 999 black pixels, 1 white pixel
        let mut image = RgbImage::from_pixel(1000, 1, Rgb([0, 0, 0]));
        image.put_pixel(999, 0, Rgb([255, 255, 255]));
        let heights = IntensityHistogram::from_rgb(&image).normalized(100);

        assert_eq!(heights.len(), HISTOGRAM_BINS);
        assert_eq!(heights[0], 100);
        assert_eq!(heights[255], 1);
        assert_eq!(heights[128], 0);
    }
}
