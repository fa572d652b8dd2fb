//! Configuration file handling for smile-match.
//!
//! Loads configuration from `~/.config/smile-match/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera::Resolution;
use crate::capture::CaptureSettings;

/// Environment variable that overrides `assets.booking_url`.
pub const BOOKING_URL_ENV: &str = "SMILE_MATCH_BOOKING_URL";

/// Configuration file structure for smile-match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Exit animation lengths and the event loop tick, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub landing_exit_ms: u32,
    pub teaser_exit_ms: u32,
    pub flash_ms: u32,
    pub capture_hold_ms: u32,
    pub capture_exit_ms: u32,
    pub matching_exit_ms: u32,
    pub booking_exit_ms: u32,
    pub tick_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            landing_exit_ms: 1500,
            teaser_exit_ms: 1000,
            flash_ms: 300,
            capture_hold_ms: 2000,
            capture_exit_ms: 1000,
            matching_exit_ms: 1000,
            booking_exit_ms: 1000,
            tick_ms: 16,
        }
    }
}

impl TimingConfig {
    /// Every delay zero except the tick; handy for scripted runs.
    pub fn instant() -> Self {
        Self {
            landing_exit_ms: 0,
            teaser_exit_ms: 0,
            flash_ms: 0,
            capture_hold_ms: 0,
            capture_exit_ms: 0,
            matching_exit_ms: 0,
            booking_exit_ms: 0,
            tick_ms: 1,
        }
    }
}

/// Where camera frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraSource {
    /// Animated test pattern
    #[default]
    Synthetic,
    /// An image file served as the live feed
    Image,
    /// No camera attached
    None,
    /// Camera access is declined
    Denied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub source: CameraSource,
    /// Image file for `source = "image"`
    pub image: Option<PathBuf>,
    /// Mirror horizontally (selfie mode)
    pub mirror: bool,
    /// Width of the captured still
    pub width: u32,
    /// Height of the captured still
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: CameraSource::default(),
            image: None,
            mirror: true,
            width: Resolution::CAPTURE.width,
            height: Resolution::CAPTURE.height,
        }
    }
}

/// Static asset references. Opaque to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub booking_url: String,
    pub trailer_url: String,
    pub comparison_image: String,
    pub background_image: String,
    pub poster_image: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            booking_url: "https://tickets.example.com/smile-2".to_string(),
            trailer_url: "/videos/trailer.mp4".to_string(),
            comparison_image: "/images/image-to-match.jpg".to_string(),
            background_image: "/images/background.jpg".to_string(),
            poster_image: "/images/poster.jpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from a file path, or the default path if `None`.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            Self::read(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a path the user named explicitly.
    /// Unlike [`Config::load`], a missing file is an error.
    pub fn load_from_explicit(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Self::read(path)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` to read variables.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(BOOKING_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.assets.booking_url = url;
        }
    }

    /// Check values that would make the experience unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "camera still size must be non-zero, got {}x{}",
                self.camera.width, self.camera.height
            )));
        }
        if self.timing.tick_ms == 0 {
            return Err(ConfigError::Invalid(
                "timing.tick_ms must be greater than 0".to_string(),
            ));
        }
        if self.camera.source == CameraSource::Image && self.camera.image.is_none() {
            return Err(ConfigError::Invalid(
                "camera.source = \"image\" requires camera.image".to_string(),
            ));
        }
        Ok(())
    }

    /// Capture pipeline settings derived from this config.
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings::default()
            .with_raster(Resolution {
                width: self.camera.width,
                height: self.camera.height,
            })
            .with_mirror(self.camera.mirror)
            .with_flash_ms(self.timing.flash_ms)
    }

    /// Serialize the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file '{}' not found", path.display())]
    NotFound { path: PathBuf },
    #[error("Failed to read config file '{}': {}", path.display(), source)]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {}", path.display(), source)]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("smile-match").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/smile-match/config.toml")
        })
}

/// Commented default file written by `config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# smile-match configuration

[timing]
# Exit animation lengths (milliseconds)
landing_exit_ms = 1500
teaser_exit_ms = 1000
# Flash after the shutter, then how long the still is held before exiting
flash_ms = 300
capture_hold_ms = 2000
capture_exit_ms = 1000
matching_exit_ms = 1000
booking_exit_ms = 1000
# Event loop frame tick
tick_ms = 16

[camera]
# synthetic | image | none | denied
source = "synthetic"
# image = "/path/to/selfie.jpg"
# Mirror horizontally (selfie mode)
mirror = true
# Size of the captured still
width = 500
height = 500

[assets]
booking_url = "https://tickets.example.com/smile-2"
trailer_url = "/videos/trailer.mp4"
comparison_image = "/images/image-to-match.jpg"
background_image = "/images/background.jpg"
poster_image = "/images/poster.jpg"

[analytics]
enabled = true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let config = Config::default();
        assert_eq!(config.timing.landing_exit_ms, 1500);
        assert_eq!(config.timing.flash_ms, 300);
        assert_eq!(config.timing.capture_hold_ms, 2000);
        assert_eq!(config.timing.booking_exit_ms, 1000);
    }

    #[test]
    fn test_default_file_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: Config = toml::from_str("[timing]\nflash_ms = 50\n").unwrap();
        assert_eq!(parsed.timing.flash_ms, 50);
        assert_eq!(parsed.timing.landing_exit_ms, 1500);
        assert!(parsed.camera.mirror);
    }

    #[test]
    fn test_camera_source_parses_lowercase() {
        let parsed: Config = toml::from_str("[camera]\nsource = \"denied\"\n").unwrap();
        assert_eq!(parsed.camera.source, CameraSource::Denied);
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::default();
        config.apply_env_from(|key| {
            (key == BOOKING_URL_ENV).then(|| "https://book.example".to_string())
        });
        assert_eq!(config.assets.booking_url, "https://book.example");
    }

    #[test]
    fn test_blank_env_override_ignored() {
        let mut config = Config::default();
        config.apply_env_from(|_| Some("  ".to_string()));
        assert_eq!(config.assets.booking_url, AssetConfig::default().booking_url);
    }

    #[test]
    fn test_validate_rejects_image_without_path() {
        let mut config = Config::default();
        config.camera.source = CameraSource::Image;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_raster() {
        let mut config = Config::default();
        config.camera.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_capture_settings_follow_config() {
        let mut config = Config::default();
        config.camera.mirror = false;
        config.timing.flash_ms = 10;
        let settings = config.capture_settings();
        assert!(!settings.mirror);
        assert_eq!(settings.flash_ms, 10);
        assert_eq!(settings.raster, Resolution::CAPTURE);
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = default_path();
        assert!(path.ends_with("smile-match/config.toml"));
    }
}
