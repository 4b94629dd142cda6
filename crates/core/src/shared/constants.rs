use std::time::Duration;

pub const APP_DIR_NAME: &str = "Facegram";

pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// How long the loading spinner stays up once a face is found.
pub const DEFAULT_SPINNER_DURATION: Duration = Duration::from_secs(1);

/// Delay between a face being found and the histogram screen appearing.
pub const DEFAULT_NAVIGATION_DELAY: Duration = Duration::from_secs(1);

/// Display regions, in pixels: phone width minus 20px padding on each side.
pub const DEFAULT_DISPLAY_WIDTH: u32 = 335;
pub const DISPLAY_PADDING: u32 = 20;
pub const IMAGE_REGION_HEIGHT: u32 = 400;
pub const HISTOGRAM_REGION_HEIGHT: u32 = 200;

pub const HISTOGRAM_BINS: usize = 256;

pub const CAPTURED_IMAGE_FILENAME: &str = "captured.png";
pub const HISTOGRAM_IMAGE_FILENAME: &str = "histogram.png";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
