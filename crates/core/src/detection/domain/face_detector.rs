use thiserror::Error;

use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::frame::Frame;
use crate::shared::orientation::Orientation;
use crate::shared::region::NormalizedRegion;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
    #[error("invalid detection request: {0}")]
    InvalidRequest(String),
}

/// Everything the detector needs to examine one frame.
#[derive(Clone, Copy, Debug)]
pub struct DetectionRequest<'a> {
    pub frame: &'a Frame,
    /// How to turn the frame upright before looking for faces.
    pub orientation: Orientation,
    /// Only faces inside this region of the upright frame are reported.
    pub region_of_interest: NormalizedRegion,
}

impl<'a> DetectionRequest<'a> {
    pub fn new(frame: &'a Frame, orientation: Orientation) -> Self {
        Self {
            frame,
            orientation,
            region_of_interest: NormalizedRegion::detection_roi(),
        }
    }
}

/// Domain interface for face detection.
///
/// An empty result means "no face", which is distinct from an `Err`
/// (the detector could not run on this frame). Implementations may keep
/// state between frames, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        request: &DetectionRequest<'_>,
    ) -> Result<Vec<FaceObservation>, DetectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;

    #[test]
    fn test_request_defaults_to_centered_roi() {
        let frame = Frame::new(vec![0; 4 * 4 * 4], 4, 4, PixelFormat::Bgra32, 0);
        let request = DetectionRequest::new(&frame, Orientation::LeftMirrored);
        assert_eq!(request.region_of_interest, NormalizedRegion::detection_roi());
        assert_eq!(request.orientation, Orientation::LeftMirrored);
        assert_eq!(request.frame.index(), 0);
    }
}
