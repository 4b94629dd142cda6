use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::display::domain::histogram_view::{DisplayError, HistogramView};
use crate::shared::constants::{CAPTURED_IMAGE_FILENAME, HISTOGRAM_IMAGE_FILENAME};

/// Presents the histogram screen as two PNG files in an output directory.
///
/// A region that is never shown leaves no file behind; `clear` removes
/// files left by an earlier run.
pub struct PngHistogramView {
    output_dir: PathBuf,
}

impl PngHistogramView {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn image_path(&self) -> PathBuf {
        self.output_dir.join(CAPTURED_IMAGE_FILENAME)
    }

    pub fn histogram_path(&self) -> PathBuf {
        self.output_dir.join(HISTOGRAM_IMAGE_FILENAME)
    }

    fn write(&self, path: &Path, image: &RgbImage) -> Result<(), DisplayError> {
        std::fs::create_dir_all(&self.output_dir)?;
        image.save(path)?;
        log::info!(
            "wrote {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(())
    }

    fn remove(path: &Path) -> Result<(), DisplayError> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                log::debug!("removed stale {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl HistogramView for PngHistogramView {
    fn clear(&mut self) -> Result<(), DisplayError> {
        Self::remove(&self.image_path())?;
        Self::remove(&self.histogram_path())
    }

    fn show_image(&mut self, image: &RgbImage) -> Result<(), DisplayError> {
        self.write(&self.image_path(), image)
    }

    fn show_histogram(&mut self, histogram: &RgbImage) -> Result<(), DisplayError> {
        self.write(&self.histogram_path(), histogram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_show_image_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = PngHistogramView::new(dir.path().join("out"));
        view.show_image(&RgbImage::from_pixel(5, 7, Rgb([50, 100, 200])))
            .unwrap();

        let img = image::open(view.image_path()).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (5, 7));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
        assert!(!view.histogram_path().exists());
    }

    #[test]
    fn test_show_histogram_writes_separate_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = PngHistogramView::new(dir.path());
        view.show_histogram(&RgbImage::new(4, 2)).unwrap();

        assert!(view.histogram_path().exists());
        assert!(!view.image_path().exists());
    }

    #[test]
    fn test_clear_removes_files_from_earlier_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = PngHistogramView::new(dir.path());
        view.show_image(&RgbImage::new(2, 2)).unwrap();
        view.show_histogram(&RgbImage::new(2, 2)).unwrap();

        view.clear().unwrap();

        assert!(!view.image_path().exists());
        assert!(!view.histogram_path().exists());
    }

    #[test]
    fn test_clear_without_files_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = PngHistogramView::new(dir.path().join("never-created"));
        assert!(view.clear().is_ok());
    }

    #[test]
    fn test_unwritable_location_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let mut view = PngHistogramView::new(blocker.join("nested"));
        assert!(view.show_image(&RgbImage::new(1, 1)).is_err());
    }
}
