use thiserror::Error;

use crate::capture::domain::camera_device::CameraPosition;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no {position} camera device found")]
    NoCameraDevice { position: CameraPosition },
    #[error("failed to open camera {url}: {reason}")]
    Open { url: String, reason: String },
    #[error("failed to decode frame: {0}")]
    Decode(String),
    #[error("frame source used before open")]
    NotOpened,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
}
