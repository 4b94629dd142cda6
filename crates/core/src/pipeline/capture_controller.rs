use crate::capture::domain::capture_view::{CaptureView, IndicatorState};
use crate::detection::domain::face_observation::FaceObservation;
use crate::pipeline::pacing::{Clock, Pacing};
use crate::shared::frame::Frame;

/// Session state. FOUND is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Searching,
    Found,
}

/// Outcome of one detection attempt, sent from the detection thread to the
/// main context.
#[derive(Debug)]
pub enum CaptureEvent {
    /// The detector ran and saw no face in the region of interest.
    NoFace { frame_index: usize, detect_ms: f64 },
    /// The detector could not run on this frame.
    DetectionFailed {
        frame_index: usize,
        reason: String,
        detect_ms: f64,
    },
    /// First frame with at least one face. Sent at most once per session.
    FaceFound {
        frame: Frame,
        observations: Vec<FaceObservation>,
        detect_ms: f64,
    },
}

impl CaptureEvent {
    pub fn detect_ms(&self) -> f64 {
        match self {
            CaptureEvent::NoFace { detect_ms, .. }
            | CaptureEvent::DetectionFailed { detect_ms, .. }
            | CaptureEvent::FaceFound { detect_ms, .. } => *detect_ms,
        }
    }
}

/// The frame that ended the search.
#[derive(Debug)]
pub struct FoundFace {
    pub frame: Frame,
    pub observations: Vec<FaceObservation>,
}

/// Drives the capture screen from detection events.
///
/// Lives on the main context, so it is the only code that touches the view.
pub struct CaptureController<'v> {
    state: CaptureState,
    view: &'v mut dyn CaptureView,
}

impl<'v> CaptureController<'v> {
    pub fn new(view: &'v mut dyn CaptureView) -> Self {
        Self {
            state: CaptureState::Searching,
            view,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Shows the initial indicator for a fresh session.
    pub fn start(&mut self) {
        self.view.set_indicator(IndicatorState::Searching);
    }

    /// Applies one event. Returns the winning frame on the SEARCHING → FOUND
    /// transition; every event after that is ignored.
    pub fn handle(&mut self, event: CaptureEvent) -> Option<FoundFace> {
        if self.state == CaptureState::Found {
            return None;
        }

        match event {
            CaptureEvent::NoFace { .. } => {
                self.view.set_indicator(IndicatorState::Searching);
                None
            }
            CaptureEvent::DetectionFailed {
                frame_index,
                reason,
                ..
            } => {
                log::debug!("detection failed on frame {frame_index}: {reason}");
                None
            }
            CaptureEvent::FaceFound {
                frame,
                observations,
                ..
            } => {
                self.state = CaptureState::Found;
                self.view.set_indicator(IndicatorState::Found);
                self.view.show_spinner();
                Some(FoundFace {
                    frame,
                    observations,
                })
            }
        }
    }

    /// Waits out the post-detection delays, then returns for navigation.
    pub fn finish(&mut self, pacing: &Pacing, clock: &dyn Clock) {
        pacing.run(clock, &mut *self.view);
    }
}
