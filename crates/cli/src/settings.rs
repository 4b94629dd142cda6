use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use facegram_core::shared::constants::{
    APP_DIR_NAME, DEFAULT_CONFIDENCE, DEFAULT_DISPLAY_WIDTH, DEFAULT_NAVIGATION_DELAY,
    DEFAULT_SPINNER_DURATION,
};

/// Persistent user preferences. Command-line flags override these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Camera input URL; discovered when unset.
    pub device: Option<String>,
    /// ffmpeg input format for `device`; the platform default when unset.
    pub input_format: Option<String>,
    pub confidence: f64,
    pub spinner_ms: u64,
    pub navigation_delay_ms: u64,
    pub display_width: u32,
    /// Drop frames that arrive while the detector is busy.
    pub discard_late_frames: bool,
    /// e.g. `"1280x720"`.
    pub video_size: Option<String>,
    /// EXIF orientation tag (1-8) of incoming frames; chosen per source
    /// when unset.
    pub orientation: Option<u8>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: None,
            input_format: None,
            confidence: DEFAULT_CONFIDENCE,
            spinner_ms: DEFAULT_SPINNER_DURATION.as_millis() as u64,
            navigation_delay_ms: DEFAULT_NAVIGATION_DELAY.as_millis() as u64,
            display_width: DEFAULT_DISPLAY_WIDTH,
            discard_late_frames: true,
            video_size: None,
            orientation: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Reads settings from `path`, falling back to defaults when the file
    /// is missing or malformed.
    pub fn load_from(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => return Self::default(),
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("ignoring malformed settings {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.confidence, 0.5);
        assert_eq!(settings.spinner_ms, 1000);
        assert_eq!(settings.navigation_delay_ms, 1000);
        assert_eq!(settings.display_width, 335);
        assert!(settings.discard_late_frames);
        assert!(settings.device.is_none());
        assert!(settings.orientation.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            device: Some("/dev/video2".into()),
            confidence: 0.7,
            video_size: Some("640x480".into()),
            orientation: Some(1),
            ..Settings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "spinner_ms": 250 }"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.spinner_ms, 250);
        assert_eq!(settings.navigation_delay_ms, 1000);
        assert_eq!(settings.confidence, 0.5);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            Settings::load_from(&dir.path().join("absent.json")),
            Settings::default()
        );
    }

    #[test]
    fn test_default_path_names_app() {
        if let Some(path) = Settings::default_path() {
            assert!(path.ends_with("Facegram/settings.json"));
        }
    }
}
