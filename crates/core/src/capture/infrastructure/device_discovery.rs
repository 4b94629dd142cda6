use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::capture::domain::camera_device::{CameraDevice, CameraPosition, DeviceDiscovery};
use crate::capture::domain::capture_error::CaptureError;

pub const V4L2_INPUT_FORMAT: &str = "video4linux2";
pub const AVFOUNDATION_INPUT_FORMAT: &str = "avfoundation";
pub const DSHOW_INPUT_FORMAT: &str = "dshow";

/// Device input format ffmpeg uses for cameras on this platform.
pub fn platform_input_format() -> &'static str {
    if cfg!(target_os = "macos") {
        AVFOUNDATION_INPUT_FORMAT
    } else if cfg!(target_os = "windows") {
        DSHOW_INPUT_FORMAT
    } else {
        V4L2_INPUT_FORMAT
    }
}

/// Finds cameras through the operating system.
///
/// - Linux: scans `/dev/video*`, naming devices from sysfs and skipping
///   metadata nodes (sysfs `index` other than 0).
/// - macOS: reports the default AVFoundation device.
/// - Elsewhere: reports nothing; devices must be configured explicitly.
pub struct SystemDeviceDiscovery {
    dev_dir: PathBuf,
    sysfs_dir: PathBuf,
}

impl SystemDeviceDiscovery {
    pub fn new() -> Self {
        Self::with_roots(Path::new("/dev"), Path::new("/sys/class/video4linux"))
    }

    pub fn with_roots(dev_dir: &Path, sysfs_dir: &Path) -> Self {
        Self {
            dev_dir: dev_dir.to_path_buf(),
            sysfs_dir: sysfs_dir.to_path_buf(),
        }
    }

    /// Lists V4L2 capture nodes under the configured roots, by node number.
    pub fn scan_v4l2(&self) -> Result<Vec<CameraDevice>, CaptureError> {
        let entries = match fs::read_dir(&self.dev_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut nodes: Vec<(u32, String)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let node = entry.file_name().to_string_lossy().into_owned();
                node_number(&node).map(|n| (n, node))
            })
            .collect();
        nodes.sort_by_key(|(n, _)| *n);

        let mut devices = Vec::new();
        for (_, node) in nodes {
            if !self.is_capture_node(&node) {
                log::debug!("Skipping non-capture node {node}");
                continue;
            }
            let name = self.read_sysfs(&node, "name").unwrap_or_else(|| node.clone());
            devices.push(CameraDevice {
                position: position_from_name(&name),
                name,
                input_url: self.dev_dir.join(&node).to_string_lossy().into_owned(),
                input_format: V4L2_INPUT_FORMAT.to_string(),
            });
        }
        Ok(devices)
    }

    fn is_capture_node(&self, node: &str) -> bool {
        self.read_sysfs(node, "index")
            .map_or(true, |index| index == "0")
    }

    fn read_sysfs(&self, node: &str, attribute: &str) -> Option<String> {
        fs::read_to_string(self.sysfs_dir.join(node).join(attribute))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl Default for SystemDeviceDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDiscovery for SystemDeviceDiscovery {
    fn discover(&self) -> Result<Vec<CameraDevice>, CaptureError> {
        if cfg!(target_os = "macos") {
            Ok(vec![CameraDevice {
                name: "Default camera".to_string(),
                input_url: "0".to_string(),
                input_format: AVFOUNDATION_INPUT_FORMAT.to_string(),
                position: CameraPosition::Front,
            }])
        } else if cfg!(target_os = "linux") {
            self.scan_v4l2()
        } else {
            Ok(Vec::new())
        }
    }
}

/// `video12` → `Some(12)`; anything else → `None`.
fn node_number(node: &str) -> Option<u32> {
    node.strip_prefix("video")
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|rest| rest.parse().ok())
}

fn position_from_name(name: &str) -> CameraPosition {
    let lower = name.to_lowercase();
    if lower.contains("rear") || lower.contains("back") {
        CameraPosition::Back
    } else {
        CameraPosition::Front
    }
}
