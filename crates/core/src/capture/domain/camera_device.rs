use std::fmt;

use crate::capture::domain::capture_error::CaptureError;

/// Which way a camera faces relative to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraPosition {
    Front,
    Back,
    /// The platform cannot tell; matches any requested position.
    Unspecified,
}

impl fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraPosition::Front => write!(f, "front"),
            CameraPosition::Back => write!(f, "back"),
            CameraPosition::Unspecified => write!(f, "any"),
        }
    }
}

/// A capture device as ffmpeg addresses it: an input URL plus the name of
/// the device input format that can open it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// e.g. `/dev/video0`, `0` (avfoundation), `video=Integrated Camera` (dshow).
    pub input_url: String,
    /// ffmpeg input format name, e.g. `video4linux2`, `avfoundation`, `dshow`.
    pub input_format: String,
    pub position: CameraPosition,
}

impl CameraDevice {
    /// A device given explicitly by the user; assumed to face them.
    pub fn configured(input_url: &str, input_format: &str) -> Self {
        Self {
            name: input_url.to_string(),
            input_url: input_url.to_string(),
            input_format: input_format.to_string(),
            position: CameraPosition::Front,
        }
    }
}

/// Enumerates the capture devices attached to this machine.
pub trait DeviceDiscovery {
    fn discover(&self) -> Result<Vec<CameraDevice>, CaptureError>;
}

/// Picks the first device facing `position`.
///
/// Devices whose position is unknown are accepted for any request. An
/// empty or non-matching list is a fatal configuration error.
pub fn select_device(
    devices: &[CameraDevice],
    position: CameraPosition,
) -> Result<CameraDevice, CaptureError> {
    devices
        .iter()
        .find(|d| {
            d.position == position
                || d.position == CameraPosition::Unspecified
                || position == CameraPosition::Unspecified
        })
        .cloned()
        .ok_or(CaptureError::NoCameraDevice { position })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, position: CameraPosition) -> CameraDevice {
        CameraDevice {
            name: name.to_string(),
            input_url: format!("/dev/{name}"),
            input_format: "video4linux2".to_string(),
            position,
        }
    }

    #[test]
    fn test_select_from_empty_list_is_no_camera() {
        let err = select_device(&[], CameraPosition::Front).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::NoCameraDevice {
                position: CameraPosition::Front
            }
        ));
    }

    #[test]
    fn test_select_skips_wrong_position() {
        let devices = vec![
            device("video0", CameraPosition::Back),
            device("video2", CameraPosition::Front),
        ];
        let chosen = select_device(&devices, CameraPosition::Front).unwrap();
        assert_eq!(chosen.name, "video2");
    }

    #[test]
    fn test_select_only_back_cameras_fails_for_front() {
        let devices = vec![device("video0", CameraPosition::Back)];
        assert!(select_device(&devices, CameraPosition::Front).is_err());
    }

    #[test]
    fn test_select_accepts_unspecified_position() {
        let devices = vec![device("video0", CameraPosition::Unspecified)];
        let chosen = select_device(&devices, CameraPosition::Front).unwrap();
        assert_eq!(chosen.name, "video0");
    }

    #[test]
    fn test_select_takes_first_match() {
        let devices = vec![
            device("video0", CameraPosition::Front),
            device("video2", CameraPosition::Front),
        ];
        assert_eq!(
            select_device(&devices, CameraPosition::Front).unwrap().name,
            "video0"
        );
    }

    #[test]
    fn test_configured_device_faces_front() {
        let d = CameraDevice::configured("/dev/video4", "video4linux2");
        assert_eq!(d.position, CameraPosition::Front);
        assert_eq!(d.input_url, "/dev/video4");
        assert_eq!(d.name, "/dev/video4");
    }
}
