use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::region::NormalizedRegion;

/// One detected face.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    /// Normalized coordinates of the upright (oriented) full frame.
    pub bounding_box: NormalizedRegion,
    pub confidence: f64,
    pub landmarks: Option<FaceLandmarks>,
}

impl FaceObservation {
    pub fn new(bounding_box: NormalizedRegion, confidence: f64) -> Self {
        Self {
            bounding_box,
            confidence,
            landmarks: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }
}
