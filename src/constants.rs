//! Constants used throughout the application

/// Number of landmarks in the 33-point body topology
pub const NUM_POSE_LANDMARKS: usize = 33;

/// Values per landmark row emitted by the landmark model (x, y, z, visibility, presence)
pub const LANDMARK_MODEL_STRIDE: usize = 5;

/// Landmark model input edge length in pixels
pub const DEFAULT_MODEL_INPUT_SIZE: i32 = 256;

/// Minimum pose presence score for a body to count as detected
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.5;

/// Requested capture resolution
pub const DEFAULT_CAPTURE_WIDTH: u32 = 1280;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 960;

/// Height every frame is resized to before detection
pub const DEFAULT_FRAME_HEIGHT: i32 = 640;

/// Listening endpoint of the label channel
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5555;

/// Default ONNX landmark model location
pub const DEFAULT_MODEL_PATH: &str = "assets/pose_landmark_full.onnx";

/// Window title of the annotated preview
pub const DEFAULT_WINDOW_NAME: &str = "Pose Classification";

/// Key codes that stop the session
pub const KEY_ESC: i32 = 27;
pub const KEY_QUIT: i32 = b'q' as i32;

/// Full circle in degrees
pub const FULL_TURN_DEGREES: f64 = 360.0;
