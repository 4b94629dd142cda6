use crate::capture::domain::capture_error::CaptureError;
use crate::shared::frame::Frame;

/// What a frame source reported when it was opened.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// 0.0 when the source has no native rate (e.g. an unpaced replay).
    pub fps: f64,
}

/// Produces a stream of frames from a camera or a recorded stand-in.
///
/// Implementations handle device and codec details while the capture
/// pipeline works with the abstract [`Frame`].
pub trait FrameSource: Send {
    /// Starts the session and returns what the source will deliver.
    fn open(&mut self) -> Result<SourceInfo, CaptureError>;

    /// Returns a lazy iterator over frames in delivery order.
    ///
    /// Per-frame errors are yielded in place; callers may skip them and
    /// keep pulling.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, CaptureError>> + '_>;

    /// Stops the session and releases the device. Idempotent.
    fn close(&mut self);
}
