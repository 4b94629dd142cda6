use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::frame_source::{FrameSource, SourceInfo};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Replays a directory of still images as if they came from a camera.
///
/// Files are delivered in file-name order. With a frame interval set, the
/// source waits between frames to imitate a camera's native rate.
pub struct ImageSequenceSource {
    dir: PathBuf,
    frame_interval: Option<Duration>,
    paths: Option<Vec<PathBuf>>,
}

impl ImageSequenceSource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            frame_interval: None,
            paths: None,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    fn open_error(&self, reason: impl ToString) -> CaptureError {
        CaptureError::Open {
            url: self.dir.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self) -> Result<SourceInfo, CaptureError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| self.open_error(e))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();

        let first = paths
            .first()
            .ok_or_else(|| self.open_error("no images found"))?;
        let (width, height) = image::image_dimensions(first).map_err(|e| self.open_error(e))?;

        let fps = self
            .frame_interval
            .filter(|d| !d.is_zero())
            .map_or(0.0, |d| 1.0 / d.as_secs_f64());

        log::info!(
            "Replaying {} images from {}",
            paths.len(),
            self.dir.display()
        );
        self.paths = Some(paths);

        Ok(SourceInfo {
            name: self.dir.display().to_string(),
            width,
            height,
            fps,
        })
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, CaptureError>> + '_> {
        let Some(paths) = self.paths.as_ref() else {
            return Box::new(std::iter::once(Err(CaptureError::NotOpened)));
        };
        let interval = self.frame_interval;

        Box::new(paths.iter().enumerate().map(move |(index, path)| -> Result<Frame, CaptureError> {
            if let Some(interval) = interval.filter(|_| index > 0) {
                std::thread::sleep(interval);
            }
            let img = image::open(path)?.to_rgb8();
            Ok(Frame::from_rgb_image(img, index))
        }))
    }

    fn close(&mut self) {
        self.paths = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use tempfile::TempDir;

    fn write_image(dir: &Path, name: &str, value: u8) {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([value, value, value]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_open_reports_first_image_dimensions() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "a.png", 10);
        let mut source = ImageSequenceSource::new(dir.path());
        let info = source.open().unwrap();
        assert_eq!((info.width, info.height), (8, 6));
        assert_eq!(info.fps, 0.0);
    }

    #[test]
    fn test_open_empty_dir_is_open_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();
        let mut source = ImageSequenceSource::new(dir.path());
        assert!(matches!(source.open(), Err(CaptureError::Open { .. })));
    }

    #[test]
    fn test_open_missing_dir_is_open_error() {
        let mut source = ImageSequenceSource::new(Path::new("/nonexistent/frames"));
        assert!(matches!(source.open(), Err(CaptureError::Open { .. })));
    }

    #[test]
    fn test_frames_are_sorted_and_indexed() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "002.png", 20);
        write_image(dir.path(), "001.png", 10);
        write_image(dir.path(), "003.png", 30);
        let mut source = ImageSequenceSource::new(dir.path());
        source.open().unwrap();

        let frames: Vec<Frame> = source.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.format(), PixelFormat::Rgb24);
            assert_eq!(frame.data()[0], (i as u8 + 1) * 10);
        }
    }

    #[test]
    fn test_undecodable_file_yields_error_in_place() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "001.png", 10);
        fs::write(dir.path().join("002.png"), b"garbage").unwrap();
        write_image(dir.path(), "003.png", 30);
        let mut source = ImageSequenceSource::new(dir.path());
        source.open().unwrap();

        let results: Vec<_> = source.frames().collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_frame_interval_sets_fps() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "a.png", 10);
        let mut source =
            ImageSequenceSource::new(dir.path()).with_frame_interval(Duration::from_millis(40));
        let info = source.open().unwrap();
        assert!((info.fps - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut source = ImageSequenceSource::new(Path::new("."));
        let result = source.frames().next().unwrap();
        assert!(matches!(result, Err(CaptureError::NotOpened)));
    }

    #[test]
    fn test_close_idempotent() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "a.png", 10);
        let mut source = ImageSequenceSource::new(dir.path());
        source.open().unwrap();
        source.close();
        source.close();
        assert!(source.frames().next().unwrap().is_err());
    }
}
