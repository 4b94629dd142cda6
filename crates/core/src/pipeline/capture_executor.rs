use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_view::CaptureView;
use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_observation::FaceObservation;
use crate::pipeline::pacing::{Clock, Pacing};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::captured_image::CapturedImage;
use crate::shared::orientation::Orientation;

/// What the source does when the detector is still busy with an earlier frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameDelivery {
    /// Keep at most one frame queued and drop newer ones. Live cameras use this.
    DiscardLate,
    /// Block the source until the detector takes the frame.
    Backpressure,
}

/// Configuration for one capture session.
pub struct CaptureConfig {
    pub orientation: Orientation,
    pub delivery: FrameDelivery,
    /// Queue size for `Backpressure`; `DiscardLate` always queues one frame.
    pub channel_capacity: usize,
    pub pacing: Pacing,
    /// Set to end the session early from outside.
    pub stop: Arc<AtomicBool>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::LeftMirrored,
            delivery: FrameDelivery::DiscardLate,
            channel_capacity: 1,
            pacing: Pacing::default(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// How a capture session ended.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// A face was found and the pacing delays have elapsed.
    ///
    /// `image` is `None` when the winning frame could not be converted.
    FaceFound {
        image: Option<CapturedImage>,
        frame_index: usize,
        observations: Vec<FaceObservation>,
    },
    /// The source ran out of frames (or was stopped) before any face was found.
    SourceExhausted,
}

/// Runs a capture session: stream frames, detect until the first face,
/// then hand off one image.
///
/// This is a port. Infrastructure decides the threading.
pub trait CaptureExecutor {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        view: &mut dyn CaptureView,
        clock: &dyn Clock,
        logger: &mut dyn PipelineLogger,
        config: CaptureConfig,
    ) -> Result<CaptureOutcome, CaptureError>;
}
