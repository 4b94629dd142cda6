use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::capture_view::CaptureView;
use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::face_detector::{DetectionRequest, FaceDetector};
use crate::pipeline::capture_controller::{CaptureController, CaptureEvent, FoundFace};
use crate::pipeline::capture_executor::{
    CaptureConfig, CaptureExecutor, CaptureOutcome, FrameDelivery,
};
use crate::pipeline::pacing::Clock;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::captured_image::CapturedImage;
use crate::shared::frame::Frame;
use crate::shared::orientation::Orientation;

/// Counters the source thread hands back when it stops.
#[derive(Debug, Default)]
struct SourceReport {
    delivered: usize,
    dropped: usize,
    undecodable: usize,
}

/// Executes a capture session with dedicated source and detection threads.
///
/// Layout: `source → detect → main [controller/view/pacing]`
///
/// The detection thread exits after sending the first `FaceFound`, which
/// drops the frame receiver and makes the source stop on its next send.
pub struct ThreadedCaptureExecutor;

impl ThreadedCaptureExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadedCaptureExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureExecutor for ThreadedCaptureExecutor {
    fn execute(
        &self,
        mut source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        view: &mut dyn CaptureView,
        clock: &dyn Clock,
        logger: &mut dyn PipelineLogger,
        config: CaptureConfig,
    ) -> Result<CaptureOutcome, CaptureError> {
        let info = source.open()?;
        logger.info(&format!(
            "Capturing from {} ({}x{} @ {:.1} fps)",
            info.name, info.width, info.height, info.fps
        ));

        let capacity = match config.delivery {
            FrameDelivery::DiscardLate => 1,
            FrameDelivery::Backpressure => config.channel_capacity.max(1),
        };
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(capacity);
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<CaptureEvent>();

        let source_handle = spawn_source(source, frame_tx, config.delivery, config.stop.clone());
        let detect_handle = spawn_detector(detector, frame_rx, event_tx, config.orientation);

        let mut controller = CaptureController::new(view);
        let found = run_main_loop(&mut controller, event_rx, logger);

        // Stop the session before pacing so the camera is released while the
        // spinner is up.
        config.stop.store(true, Ordering::Relaxed);
        join_threads(source_handle, detect_handle, logger)?;

        let outcome = match found {
            Some(FoundFace {
                frame,
                observations,
            }) => {
                let frame_index = frame.index();
                logger.metric("observations", observations.len() as f64);
                logger.info(&format!(
                    "Face found in frame {frame_index} ({} observation(s))",
                    observations.len()
                ));
                let image = CapturedImage::from_frame(&frame);
                if image.is_none() {
                    log::warn!("frame {frame_index} could not be converted for display");
                }
                controller.finish(&config.pacing, clock);
                CaptureOutcome::FaceFound {
                    image,
                    frame_index,
                    observations,
                }
            }
            None => {
                logger.info("Source ended before a face was found");
                CaptureOutcome::SourceExhausted
            }
        };

        logger.summary();
        Ok(outcome)
    }
}

fn spawn_source(
    mut source: Box<dyn FrameSource>,
    frame_tx: Sender<Frame>,
    delivery: FrameDelivery,
    stop: Arc<AtomicBool>,
) -> JoinHandle<SourceReport> {
    std::thread::spawn(move || {
        let mut report = SourceReport::default();
        for frame_result in source.frames() {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            let frame = match frame_result {
                Ok(frame) => frame,
                Err(e) => {
                    log::debug!("skipping frame: {e}");
                    report.undecodable += 1;
                    continue;
                }
            };
            match delivery {
                FrameDelivery::DiscardLate => match frame_tx.try_send(frame) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(late)) => {
                        log::trace!("detector busy, dropping frame {}", late.index());
                        report.dropped += 1;
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                },
                FrameDelivery::Backpressure => {
                    if frame_tx.send(frame).is_err() {
                        break;
                    }
                    report.delivered += 1;
                }
            }
        }
        source.close();
        report
    })
}

fn spawn_detector(
    mut detector: Box<dyn FaceDetector>,
    frame_rx: Receiver<Frame>,
    event_tx: Sender<CaptureEvent>,
    orientation: Orientation,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for frame in frame_rx {
            let started = Instant::now();
            let result = detector.detect(&DetectionRequest::new(&frame, orientation));
            let detect_ms = started.elapsed().as_secs_f64() * 1000.0;

            let event = match result {
                Ok(observations) if observations.is_empty() => CaptureEvent::NoFace {
                    frame_index: frame.index(),
                    detect_ms,
                },
                Ok(observations) => {
                    // Last event of the session; returning drops the receiver.
                    let _ = event_tx.send(CaptureEvent::FaceFound {
                        frame,
                        observations,
                        detect_ms,
                    });
                    return;
                }
                Err(e) => CaptureEvent::DetectionFailed {
                    frame_index: frame.index(),
                    reason: e.to_string(),
                    detect_ms,
                },
            };

            if event_tx.send(event).is_err() {
                return;
            }
        }
    })
}

/// Feeds detection events to the controller until a face is found or the
/// detection thread hangs up.
fn run_main_loop(
    controller: &mut CaptureController<'_>,
    event_rx: Receiver<CaptureEvent>,
    logger: &mut dyn PipelineLogger,
) -> Option<FoundFace> {
    controller.start();
    let mut examined = 0usize;
    let mut failures = 0usize;

    for event in event_rx {
        examined += 1;
        logger.timing("detect", event.detect_ms());
        logger.progress(examined);
        if matches!(event, CaptureEvent::DetectionFailed { .. }) {
            failures += 1;
        }

        if let Some(found) = controller.handle(event) {
            logger.metric("detection_failures", failures as f64);
            return Some(found);
        }
    }

    logger.metric("detection_failures", failures as f64);
    None
}

/// Joins both worker threads, reporting the first panic.
fn join_threads(
    source_handle: JoinHandle<SourceReport>,
    detect_handle: JoinHandle<()>,
    logger: &mut dyn PipelineLogger,
) -> Result<(), CaptureError> {
    let detect_result = detect_handle.join();
    let source_result = source_handle.join();

    let report = source_result.map_err(|_| CaptureError::WorkerPanicked("source"))?;
    detect_result.map_err(|_| CaptureError::WorkerPanicked("detection"))?;

    log::debug!(
        "source delivered {} frame(s), dropped {}, skipped {} undecodable",
        report.delivered,
        report.dropped,
        report.undecodable
    );
    logger.metric("dropped_frames", report.dropped as f64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::capture_view::IndicatorState;
    use crate::capture::domain::frame_source::SourceInfo;
    use crate::detection::domain::face_detector::DetectionError;
    use crate::detection::domain::face_observation::FaceObservation;
    use crate::pipeline::pacing::tests::RecordingClock;
    use crate::pipeline::pacing::Pacing;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::frame::PixelFormat;
    use crate::shared::region::NormalizedRegion;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    // --- Stubs ---

    /// Frame `i` is a 4x2 BGRA image filled with blue = `i`.
    fn frame(i: usize) -> Frame {
        let mut data = Vec::with_capacity(4 * 2 * 4);
        for _ in 0..8 {
            data.extend_from_slice(&[i as u8, 0, 0, 255]);
        }
        Frame::new(data, 4, 2, PixelFormat::Bgra32, i)
    }

    struct StubSource {
        frames: Vec<Result<Frame, CaptureError>>,
        pulled: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
        fail_open: bool,
    }

    impl StubSource {
        fn new(count: usize) -> Self {
            Self::from_results((0..count).map(|i| Ok(frame(i))).collect())
        }

        fn from_results(frames: Vec<Result<Frame, CaptureError>>) -> Self {
            Self {
                frames,
                pulled: Arc::new(AtomicUsize::new(0)),
                closed: Arc::new(AtomicBool::new(false)),
                fail_open: false,
            }
        }
    }

    impl FrameSource for StubSource {
        fn open(&mut self) -> Result<SourceInfo, CaptureError> {
            if self.fail_open {
                return Err(CaptureError::Open {
                    url: "stub".into(),
                    reason: "busy".into(),
                });
            }
            Ok(SourceInfo {
                name: "stub".into(),
                width: 4,
                height: 2,
                fps: 0.0,
            })
        }

        fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, CaptureError>> + '_> {
            let pulled = self.pulled.clone();
            Box::new(self.frames.drain(..).inspect(move |_| {
                pulled.fetch_add(1, Ordering::SeqCst);
            }))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    enum Verdict {
        NoFace,
        Face,
        Fail,
    }

    /// Scripted detector: verdict per frame index, `NoFace` past the end.
    struct ScriptedDetector {
        script: Vec<Verdict>,
        calls: Arc<AtomicUsize>,
        rois: Arc<Mutex<Vec<NormalizedRegion>>>,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Verdict>) -> Self {
            Self {
                script,
                calls: Arc::new(AtomicUsize::new(0)),
                rois: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(
            &mut self,
            request: &DetectionRequest<'_>,
        ) -> Result<Vec<FaceObservation>, DetectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rois.lock().unwrap().push(request.region_of_interest);
            match self.script.get(request.frame.index()) {
                Some(Verdict::Face) => Ok(vec![FaceObservation::new(
                    NormalizedRegion::new(0.4, 0.4, 0.2, 0.2),
                    0.9,
                )]),
                Some(Verdict::Fail) => Err(DetectionError::Inference("stub failure".into())),
                _ => Ok(Vec::new()),
            }
        }
    }

    struct PanickingDetector;

    impl FaceDetector for PanickingDetector {
        fn detect(
            &mut self,
            _request: &DetectionRequest<'_>,
        ) -> Result<Vec<FaceObservation>, DetectionError> {
            panic!("detector bug");
        }
    }

    #[derive(Debug, PartialEq)]
    enum ViewCall {
        Indicator(IndicatorState),
        ShowSpinner,
        HideSpinner,
    }

    #[derive(Default)]
    struct RecordingView {
        calls: Vec<ViewCall>,
    }

    impl CaptureView for RecordingView {
        fn set_indicator(&mut self, state: IndicatorState) {
            self.calls.push(ViewCall::Indicator(state));
        }
        fn show_spinner(&mut self) {
            self.calls.push(ViewCall::ShowSpinner);
        }
        fn hide_spinner(&mut self) {
            self.calls.push(ViewCall::HideSpinner);
        }
    }

    fn backpressure() -> CaptureConfig {
        CaptureConfig {
            delivery: FrameDelivery::Backpressure,
            ..CaptureConfig::default()
        }
    }

    fn run(
        source: StubSource,
        detector: Box<dyn FaceDetector>,
        view: &mut RecordingView,
        clock: &RecordingClock,
        config: CaptureConfig,
    ) -> Result<CaptureOutcome, CaptureError> {
        ThreadedCaptureExecutor::new().execute(
            Box::new(source),
            detector,
            view,
            clock,
            &mut NullPipelineLogger,
            config,
        )
    }

    fn fifth_frame_script() -> Vec<Verdict> {
        vec![
            Verdict::NoFace,
            Verdict::NoFace,
            Verdict::NoFace,
            Verdict::NoFace,
            Verdict::Face,
        ]
    }

    // --- Tests ---

    #[test]
    fn test_face_on_fifth_frame_stops_detection() {
        let source = StubSource::new(10);
        let closed = source.closed.clone();
        let pulled = source.pulled.clone();
        let detector = ScriptedDetector::new(fifth_frame_script());
        let calls = detector.calls.clone();
        let mut view = RecordingView::default();
        let clock = RecordingClock::new();

        let outcome = run(source, Box::new(detector), &mut view, &clock, backpressure()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(closed.load(Ordering::SeqCst));
        // At most one queued and one blocked frame beyond the winner
        assert!(pulled.load(Ordering::SeqCst) <= 7);
        match outcome {
            CaptureOutcome::FaceFound {
                image,
                frame_index,
                observations,
            } => {
                assert_eq!(frame_index, 4);
                assert_eq!(observations.len(), 1);
                let image = image.unwrap();
                assert_eq!(image.frame_index(), 4);
                // BGRA blue channel 4 → RGB [0, 0, 4]
                assert!(image.image().pixels().all(|p| p.0 == [0, 0, 4]));
            }
            other => panic!("expected FaceFound, got {other:?}"),
        }
    }

    #[test]
    fn test_indicator_sequence_and_pacing() {
        let detector = ScriptedDetector::new(fifth_frame_script());
        let mut view = RecordingView::default();
        let clock = RecordingClock::new();

        run(StubSource::new(10), Box::new(detector), &mut view, &clock, backpressure()).unwrap();

        let mut expected = vec![ViewCall::Indicator(IndicatorState::Searching)];
        expected.extend((0..4).map(|_| ViewCall::Indicator(IndicatorState::Searching)));
        expected.extend([
            ViewCall::Indicator(IndicatorState::Found),
            ViewCall::ShowSpinner,
            ViewCall::HideSpinner,
        ]);
        assert_eq!(view.calls, expected);
        assert_eq!(
            *clock.sleeps.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(1)]
        );
    }

    #[test]
    fn test_every_request_uses_centered_roi() {
        let detector = ScriptedDetector::new(fifth_frame_script());
        let rois = detector.rois.clone();
        let mut view = RecordingView::default();

        run(
            StubSource::new(10),
            Box::new(detector),
            &mut view,
            &RecordingClock::new(),
            backpressure(),
        )
        .unwrap();

        let rois = rois.lock().unwrap();
        assert_eq!(rois.len(), 5);
        assert!(rois.iter().all(|r| *r == NormalizedRegion::detection_roi()));
    }

    #[test]
    fn test_detection_failures_do_not_stop_capture() {
        let detector = ScriptedDetector::new(vec![
            Verdict::Fail,
            Verdict::NoFace,
            Verdict::Fail,
            Verdict::Face,
        ]);
        let calls = detector.calls.clone();
        let mut view = RecordingView::default();

        let outcome = run(
            StubSource::new(6),
            Box::new(detector),
            &mut view,
            &RecordingClock::new(),
            backpressure(),
        )
        .unwrap();

        assert!(matches!(outcome, CaptureOutcome::FaceFound { frame_index: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Initial Searching, one for the NoFace frame, none for failures
        let searching = view
            .calls
            .iter()
            .filter(|c| **c == ViewCall::Indicator(IndicatorState::Searching))
            .count();
        assert_eq!(searching, 2);
    }

    #[test]
    fn test_undecodable_frames_are_skipped() {
        let source = StubSource::from_results(vec![
            Err(CaptureError::Decode("corrupt".into())),
            Ok(frame(1)),
        ]);
        let detector = ScriptedDetector::new(vec![Verdict::NoFace, Verdict::Face]);
        let mut view = RecordingView::default();

        let outcome = run(
            source,
            Box::new(detector),
            &mut view,
            &RecordingClock::new(),
            backpressure(),
        )
        .unwrap();
        assert!(matches!(outcome, CaptureOutcome::FaceFound { frame_index: 1, .. }));
    }

    #[test]
    fn test_source_exhausted_without_face() {
        let source = StubSource::new(3);
        let closed = source.closed.clone();
        let detector = ScriptedDetector::new(Vec::new());
        let calls = detector.calls.clone();
        let mut view = RecordingView::default();
        let clock = RecordingClock::new();

        let outcome = run(source, Box::new(detector), &mut view, &clock, backpressure()).unwrap();

        assert!(matches!(outcome, CaptureOutcome::SourceExhausted));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(closed.load(Ordering::SeqCst));
        assert!(!view.calls.contains(&ViewCall::ShowSpinner));
        assert!(clock.sleeps.lock().unwrap().is_empty());
    }

    #[test]
    fn test_open_failure_is_returned_before_any_view_call() {
        let mut source = StubSource::new(3);
        source.fail_open = true;
        let mut view = RecordingView::default();

        let result = run(
            source,
            Box::new(ScriptedDetector::new(Vec::new())),
            &mut view,
            &RecordingClock::new(),
            backpressure(),
        );

        assert!(matches!(result, Err(CaptureError::Open { .. })));
        assert!(view.calls.is_empty());
    }

    #[test]
    fn test_stop_flag_ends_session() {
        let config = backpressure();
        config.stop.store(true, Ordering::SeqCst);
        let detector = ScriptedDetector::new(vec![Verdict::Face]);
        let calls = detector.calls.clone();
        let mut view = RecordingView::default();

        let outcome = run(
            StubSource::new(5),
            Box::new(detector),
            &mut view,
            &RecordingClock::new(),
            config,
        )
        .unwrap();

        assert!(matches!(outcome, CaptureOutcome::SourceExhausted));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_discard_late_still_finds_face() {
        // Every frame has a face, so whichever frame reaches the detector first wins
        let detector = ScriptedDetector::new((0..20).map(|_| Verdict::Face).collect());
        let calls = detector.calls.clone();
        let mut view = RecordingView::default();
        let config = CaptureConfig {
            pacing: Pacing {
                spinner: Duration::ZERO,
                navigation_delay: Duration::ZERO,
            },
            ..CaptureConfig::default()
        };

        let outcome = run(
            StubSource::new(20),
            Box::new(detector),
            &mut view,
            &RecordingClock::new(),
            config,
        )
        .unwrap();

        assert!(matches!(outcome, CaptureOutcome::FaceFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detector_panic_is_reported() {
        let mut view = RecordingView::default();
        let result = run(
            StubSource::new(2),
            Box::new(PanickingDetector),
            &mut view,
            &RecordingClock::new(),
            backpressure(),
        );
        assert!(matches!(
            result,
            Err(CaptureError::WorkerPanicked("detection"))
        ));
    }
}
