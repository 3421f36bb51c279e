//! Configuration management for the pose classification server

use crate::{
    camera::VideoSource,
    constants::{
        DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, DEFAULT_FRAME_HEIGHT, DEFAULT_HOST,
        DEFAULT_MIN_DETECTION_CONFIDENCE, DEFAULT_MODEL_INPUT_SIZE, DEFAULT_MODEL_PATH, DEFAULT_PORT,
        DEFAULT_WINDOW_NAME,
    },
    pipeline::PipelineSettings,
    server::ViewSettings,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture device configuration
    pub camera: CameraConfig,

    /// Frame preprocessing
    pub processing: ProcessingConfig,

    /// Landmark model configuration
    pub model: ModelConfig,

    /// Listening endpoint
    pub server: ServerConfig,

    /// Preview window
    pub display: DisplayConfig,
}

/// Capture device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Webcam index
    pub index: i32,

    /// Requested capture width
    pub capture_width: u32,

    /// Requested capture height
    pub capture_height: u32,

    /// Mirror frames horizontally (selfie view)
    pub mirror: bool,

    /// Read from this video file instead of the webcam
    pub video_file: Option<String>,
}

/// Frame preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Height frames are resized to, keeping aspect ratio
    pub frame_height: i32,
}

/// Landmark model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the ONNX landmark model
    pub path: PathBuf,

    /// Pose presence threshold (0.0-1.0)
    pub min_detection_confidence: f32,

    /// Square model input edge in pixels
    pub input_size: i32,
}

/// Listening endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Preview window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show the annotated preview window
    pub enabled: bool,

    /// Window title
    pub window_name: String,

    /// Draw the FPS counter
    pub show_fps: bool,

    /// Draw landmarks and skeleton
    pub draw_landmarks: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            capture_width: DEFAULT_CAPTURE_WIDTH,
            capture_height: DEFAULT_CAPTURE_HEIGHT,
            mirror: true,
            video_file: None,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            frame_height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
            input_size: DEFAULT_MODEL_INPUT_SIZE,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_name: DEFAULT_WINDOW_NAME.to_string(),
            show_fps: true,
            draw_landmarks: true,
        }
    }
}

impl CameraConfig {
    pub fn video_source(&self) -> VideoSource {
        match &self.video_file {
            Some(path) => VideoSource::File(path.clone()),
            None => VideoSource::Camera(self.index),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::ConfigError`
    /// if it is not valid configuration YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` for malformed YAML or mistyped fields.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if serialization fails and `Error::Io` if
    /// the file cannot be written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            mirror: self.camera.mirror,
            frame_height: self.processing.frame_height,
        }
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            enabled: self.display.enabled,
            window_name: self.display.window_name.clone(),
            show_fps: self.display.show_fps,
            draw_landmarks: self.display.draw_landmarks,
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` naming the first out-of-range setting.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.model.min_detection_confidence) {
            return Err(Error::ConfigError(
                "Minimum detection confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.model.input_size <= 0 {
            return Err(Error::ConfigError("Model input size must be greater than 0".to_string()));
        }
        if self.processing.frame_height <= 0 {
            return Err(Error::ConfigError("Frame height must be greater than 0".to_string()));
        }
        if self.camera.capture_width == 0 || self.camera.capture_height == 0 {
            return Err(Error::ConfigError("Capture size must be greater than 0".to_string()));
        }
        if self.server.host.trim().is_empty() {
            return Err(Error::ConfigError("Server host must not be empty".to_string()));
        }
        if self.display.enabled && self.display.window_name.is_empty() {
            return Err(Error::ConfigError("Window name must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Body Pose Classification Configuration

# Capture device
camera:
  index: 0
  capture_width: 1280
  capture_height: 960
  mirror: true
  # video_file: "media/running.mp4"

# Frame preprocessing
processing:
  frame_height: 640

# Landmark model
model:
  path: "assets/pose_landmark_full.onnx"
  min_detection_confidence: 0.5
  input_size: 256

# Label channel endpoint
server:
  host: "localhost"
  port: 5555

# Preview window
display:
  enabled: true
  window_name: "Pose Classification"
  show_fps: true
  draw_landmarks: true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed = Config::from_yaml("server:\n  port: 6000\n").unwrap();
        assert_eq!(parsed.server.port, 6000);
        assert_eq!(parsed.server.host, "localhost");
        assert_eq!(parsed.processing.frame_height, 640);
    }

    #[test]
    fn test_video_source() {
        let mut camera = CameraConfig::default();
        assert_eq!(camera.video_source(), VideoSource::Camera(0));
        camera.video_file = Some("clip.mp4".to_string());
        assert_eq!(camera.video_source(), VideoSource::File("clip.mp4".to_string()));
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.model.min_detection_confidence = 1.5;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = Config::default();
        config.processing.frame_height = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.host = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.server.port = 7001;
        config.camera.video_file = Some("media/running.mp4".to_string());
        config.display.enabled = false;
        config.to_file(&path).unwrap();

        let reloaded = Config::from_file(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            Config::from_file(dir.path().join("absent.yaml")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            Config::from_yaml("server: [unclosed"),
            Err(Error::ConfigError(_))
        ));
    }
}
