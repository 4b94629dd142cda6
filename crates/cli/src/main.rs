mod settings;
mod terminal_view;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use facegram_core::capture::domain::camera_device::{
    select_device, CameraDevice, CameraPosition, DeviceDiscovery,
};
use facegram_core::capture::domain::capture_view::CaptureView;
use facegram_core::capture::domain::frame_source::FrameSource;
use facegram_core::capture::infrastructure::device_discovery::{
    platform_input_format, SystemDeviceDiscovery,
};
use facegram_core::capture::infrastructure::ffmpeg_camera_source::{
    CameraOptions, FfmpegCameraSource,
};
use facegram_core::capture::infrastructure::image_sequence_source::ImageSequenceSource;
use facegram_core::detection::domain::face_detector::FaceDetector;
use facegram_core::detection::infrastructure::model_resolver::ModelResolver;
use facegram_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facegram_core::display::domain::display_layout::DisplayLayout;
use facegram_core::display::infrastructure::png_histogram_view::PngHistogramView;
use facegram_core::histogram::infrastructure::bar_histogram_renderer::BarHistogramRenderer;
use facegram_core::pipeline::capture_executor::{
    CaptureConfig, CaptureExecutor, CaptureOutcome, FrameDelivery,
};
use facegram_core::pipeline::display_histogram_use_case::DisplayHistogramUseCase;
use facegram_core::pipeline::infrastructure::threaded_capture_executor::ThreadedCaptureExecutor;
use facegram_core::pipeline::pacing::{Pacing, SystemClock};
use facegram_core::pipeline::pipeline_logger::LogPipelineLogger;
use facegram_core::shared::captured_image::CapturedImage;
use facegram_core::shared::constants::{YOLO_MODEL_NAME, YOLO_MODEL_URL};
use facegram_core::shared::orientation::Orientation;

use settings::Settings;
use terminal_view::TerminalCaptureView;

/// Capture a face from the camera and render its intensity histogram.
#[derive(Parser)]
#[command(name = "facegram")]
struct Cli {
    /// Camera input (e.g. /dev/video0, 0 on macOS, video=Name on Windows).
    #[arg(long)]
    device: Option<String>,

    /// ffmpeg input device format override (video4linux2, avfoundation, dshow).
    #[arg(long)]
    input_format: Option<String>,

    /// Replay a directory of images instead of opening a camera.
    #[arg(long, conflicts_with = "device")]
    frames: Option<PathBuf>,

    /// Print discovered cameras and exit.
    #[arg(long)]
    list_devices: bool,

    /// Directory for captured.png and histogram.png.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// How long the spinner stays up after a face is found.
    #[arg(long)]
    spinner_ms: Option<u64>,

    /// Delay before the histogram is shown.
    #[arg(long)]
    navigation_delay_ms: Option<u64>,

    /// EXIF orientation tag (1-8) of incoming frames. Cameras default to 5
    /// (mirrored front camera), replays to 1 (upright).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=8))]
    orientation: Option<u8>,

    /// Settings file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings to the settings file and exit.
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Flags take precedence over stored settings.
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(device) = &self.device {
            settings.device = Some(device.clone());
        }
        if let Some(format) = &self.input_format {
            settings.input_format = Some(format.clone());
        }
        if let Some(confidence) = self.confidence {
            settings.confidence = confidence;
        }
        if let Some(ms) = self.spinner_ms {
            settings.spinner_ms = ms;
        }
        if let Some(ms) = self.navigation_delay_ms {
            settings.navigation_delay_ms = ms;
        }
        if let Some(tag) = self.orientation {
            settings.orientation = Some(tag);
        }
    }

    fn settings_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Settings::default_path)
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings_path = cli.settings_path();
    let mut settings = settings_path
        .as_deref()
        .map(Settings::load_from)
        .unwrap_or_default();
    cli.apply_to(&mut settings);
    validate(&settings)?;

    if cli.save_config {
        let path = settings_path.ok_or("Could not determine the settings file location")?;
        settings.save_to(&path)?;
        log::info!("Settings written to {}", path.display());
        return Ok(());
    }

    if cli.list_devices {
        return list_devices();
    }

    let Session {
        source,
        detector,
        mut view,
    } = start_session(
        &cli,
        &settings,
        &SystemDeviceDiscovery::new(),
        build_detector,
        TerminalCaptureView::stderr,
    )?;

    let config = CaptureConfig {
        orientation: orientation_for(&cli, &settings),
        delivery: delivery_for(&cli, &settings),
        pacing: Pacing {
            spinner: Duration::from_millis(settings.spinner_ms),
            navigation_delay: Duration::from_millis(settings.navigation_delay_ms),
        },
        ..CaptureConfig::default()
    };

    let mut logger = LogPipelineLogger::default();
    let outcome = ThreadedCaptureExecutor::new().execute(
        source,
        detector,
        &mut view,
        &SystemClock,
        &mut logger,
        config,
    )?;

    match outcome {
        CaptureOutcome::FaceFound { image, .. } => present(image, &cli.output, &settings),
        CaptureOutcome::SourceExhausted => log::info!("No face found"),
    }
    Ok(())
}

/// Everything a capture session needs, built in startup order.
struct Session<V> {
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    view: V,
}

/// The camera is selected first, so a missing device fails before the
/// model is loaded or any view exists.
fn start_session<V: CaptureView>(
    cli: &Cli,
    settings: &Settings,
    discovery: &dyn DeviceDiscovery,
    build_detector: impl FnOnce(f64) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>>,
    build_view: impl FnOnce() -> V,
) -> Result<Session<V>, Box<dyn std::error::Error>> {
    let source = open_source(cli, settings, discovery)?;
    let detector = build_detector(settings.confidence)?;
    Ok(Session {
        source,
        detector,
        view: build_view(),
    })
}

fn present(
    image: Option<CapturedImage>,
    output: &Path,
    settings: &Settings,
) {
    let mut use_case = DisplayHistogramUseCase::new(
        Box::new(PngHistogramView::new(output)),
        Box::new(BarHistogramRenderer::default()),
        DisplayLayout::with_width(settings.display_width),
    );
    let shown = use_case.execute(image);
    log::info!(
        "Histogram screen: image {}, histogram {}",
        if shown.image_shown { "shown" } else { "empty" },
        if shown.histogram_shown { "shown" } else { "empty" }
    );
}

fn open_source(
    cli: &Cli,
    settings: &Settings,
    discovery: &dyn DeviceDiscovery,
) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    if let Some(dir) = &cli.frames {
        if !dir.is_dir() {
            return Err(format!("Frames directory not found: {}", dir.display()).into());
        }
        return Ok(Box::new(ImageSequenceSource::new(dir)));
    }

    let device = match &settings.device {
        Some(url) => {
            let format = settings
                .input_format
                .as_deref()
                .unwrap_or(platform_input_format());
            CameraDevice::configured(url, format)
        }
        None => {
            let devices = discovery.discover()?;
            select_device(&devices, CameraPosition::Front)?
        }
    };
    log::info!("Using camera {} ({})", device.name, device.input_url);

    let options = CameraOptions {
        video_size: settings.video_size.clone(),
        framerate: None,
    };
    Ok(Box::new(FfmpegCameraSource::new(device, options)))
}

fn delivery_for(cli: &Cli, settings: &Settings) -> FrameDelivery {
    // Replays have no real-time constraint, so every frame is examined
    if cli.frames.is_some() || !settings.discard_late_frames {
        FrameDelivery::Backpressure
    } else {
        FrameDelivery::DiscardLate
    }
}

/// An explicit tag wins; otherwise replays are upright and cameras are
/// mirrored front cameras.
fn orientation_for(cli: &Cli, settings: &Settings) -> Orientation {
    match settings.orientation.and_then(Orientation::from_exif) {
        Some(orientation) => orientation,
        None if cli.frames.is_some() => Orientation::Up,
        None => Orientation::LeftMirrored,
    }
}

fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let devices = SystemDeviceDiscovery::new().discover()?;
    if devices.is_empty() {
        println!("No camera devices found");
    }
    for device in devices {
        println!(
            "{}\t{}\t{}\t{}",
            device.input_url, device.input_format, device.position, device.name
        );
    }
    Ok(())
}

fn build_detector(confidence: f64) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let model_path = ModelResolver::new()?.resolve(
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        Some(Box::new(download_progress)),
    )?;
    Ok(Box::new(OnnxYoloDetector::new(&model_path, confidence)?))
}

fn validate(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&settings.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            settings.confidence
        )
        .into());
    }
    if settings.display_width == 0 {
        return Err("Display width must be positive".into());
    }
    if let Some(tag) = settings.orientation {
        if Orientation::from_exif(tag).is_none() {
            return Err(format!("Orientation must be an EXIF tag from 1 to 8, got {tag}").into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
