//! Body pose classification library for real-time posture labelling.
//!
//! Frames from a camera are passed through a 33-point body landmark model,
//! a handful of joint angles are derived from the skeleton, and the posture
//! is classified against a fixed rule table. Recognized postures are pushed
//! to a WebSocket subscriber as `{"label": "..."}` text messages.
//!
//! The pipeline consists of:
//! 1. Frame acquisition, mirroring and fixed-height resize
//! 2. Landmark detection with ONNX Runtime
//! 3. Joint angle calculation and rule-based classification
//! 4. Publishing the label to the connected subscriber
//!
//! # Examples
//!
//! ## Classifying landmarks
//!
//! ```
//! use body_pose_classification::{
//!     classifier::{classify_angles, JointAngles, PoseLabel},
//! };
//!
//! let angles = JointAngles {
//!     left_elbow: 180.0,
//!     right_elbow: 180.0,
//!     left_shoulder: 90.0,
//!     right_shoulder: 90.0,
//!     left_knee: 180.0,
//!     right_knee: 180.0,
//!     left_hip: 180.0,
//!     right_hip: 180.0,
//! };
//! assert_eq!(classify_angles(&angles), PoseLabel::TPose);
//! ```
//!
//! ## Joint angles
//!
//! ```
//! use body_pose_classification::{angles::calculate_angle, landmarks::Landmark};
//!
//! let shoulder = Landmark::planar(0.0, 0.0);
//! let elbow = Landmark::planar(1.0, 0.0);
//! let wrist = Landmark::planar(2.0, 0.0);
//! assert!((calculate_angle(&shoulder, &elbow, &wrist) - 180.0).abs() < 1e-9);
//! ```
//!
//! ## Serving labels
//!
//! ```no_run
//! use body_pose_classification::{
//!     camera::{CaptureDevice, VideoSource},
//!     config::Config,
//!     detection::OnnxPoseDetector,
//!     server::{bind, LabelServer},
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> body_pose_classification::Result<()> {
//! let config = Config::default();
//! let detector = OnnxPoseDetector::new(&config.model.path, 256, 0.5)?;
//! let listener = bind("localhost", 5555).await?;
//!
//! let mut server = LabelServer::new(
//!     detector,
//!     || CaptureDevice::open(&VideoSource::Camera(0), 1280, 960),
//!     config.pipeline_settings(),
//!     config.view_settings(),
//! );
//! server.serve(listener, CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

/// Landmark types for the 33-point body topology
pub mod landmarks;

/// Joint angle calculation
pub mod angles;

/// Rule-based posture classification
pub mod classifier;

/// Landmark detection behind a capability trait
pub mod detection;

/// Frame acquisition and preprocessing
pub mod camera;

/// Preview window and stop key
pub mod display;

/// Label wire format and delivery
pub mod publisher;

/// Per-frame processing loop
pub mod pipeline;

/// WebSocket listening endpoint
pub mod server;

/// Utility functions for numeric conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
