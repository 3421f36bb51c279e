//! Frame acquisition and preprocessing.
//!
//! [`CaptureDevice`] owns the OpenCV capture handle for the lifetime of one
//! session and releases it on drop, so every exit path of the pipeline frees
//! the camera.

use crate::{utils::safe_cast::f64_to_i32, Error, Result};
use log::{debug, info, warn};
use opencv::{
    core::{self, Mat, Size},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};

/// Where frames come from
#[derive(Debug, Clone, PartialEq)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

/// Result of one read attempt
#[derive(Debug)]
pub enum FrameRead {
    /// A frame was read
    Frame(Mat),
    /// Nothing usable this time; try again on the next iteration
    Skipped,
    /// The source has no more frames
    Finished,
}

/// A sequential supply of BGR frames
pub trait FrameSource {
    /// Read the next frame
    fn read_frame(&mut self) -> Result<FrameRead>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<FrameRead> {
        (**self).read_frame()
    }
}

/// OpenCV-backed camera or video file
pub struct CaptureDevice {
    capture: VideoCapture,
    source: VideoSource,
}

impl CaptureDevice {
    /// Open `source`, requesting `width`×`height` from cameras
    ///
    /// # Errors
    ///
    /// Returns `Error::Camera` if the device or file cannot be opened.
    pub fn open(source: &VideoSource, width: u32, height: u32) -> Result<Self> {
        let mut capture = match source {
            VideoSource::Camera(index) => {
                info!("Opening camera {}", index);
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;
                cap.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(width))?;
                cap.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(height))?;
                // Reduce buffer size for lower latency
                cap.set(CAP_PROP_BUFFERSIZE, 1.0)?;
                cap
            }
            VideoSource::File(path) => {
                info!("Opening video file: {}", path);
                VideoCapture::from_file(path, videoio::CAP_ANY)?
            }
        };

        if !capture.is_opened()? {
            // Release whatever backend state was allocated
            capture.release()?;
            return Err(Error::Camera(format!("{source:?} is not available")));
        }

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)?;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?;
        info!("Capture opened at {}x{}", actual_width, actual_height);

        Ok(Self {
            capture,
            source: source.clone(),
        })
    }
}

impl FrameSource for CaptureDevice {
    fn read_frame(&mut self) -> Result<FrameRead> {
        if !self.capture.is_opened()? {
            return Ok(FrameRead::Finished);
        }

        let mut frame = Mat::default();
        let ok = self.capture.read(&mut frame)?;
        if ok && !frame.empty() {
            return Ok(FrameRead::Frame(frame));
        }

        match self.source {
            VideoSource::File(_) => {
                info!("End of video file reached");
                Ok(FrameRead::Finished)
            }
            VideoSource::Camera(_) => {
                debug!("Empty camera frame, skipping");
                Ok(FrameRead::Skipped)
            }
        }
    }
}

impl Drop for CaptureDevice {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(()) => info!("Released {:?}", self.source),
            Err(e) => warn!("Failed to release {:?}: {}", self.source, e),
        }
    }
}

/// Width that keeps the aspect ratio when scaling `height` to `target_height`
///
/// # Errors
///
/// Returns `Error::InvalidInput` for non-positive sizes.
pub fn scaled_width(width: i32, height: i32, target_height: i32) -> Result<i32> {
    if width <= 0 || height <= 0 || target_height <= 0 {
        return Err(Error::InvalidInput(format!(
            "Cannot scale {width}x{height} to height {target_height}"
        )));
    }
    f64_to_i32(f64::from(width) * (f64::from(target_height) / f64::from(height)))
}

/// Mirror (optionally) and resize a frame to a fixed height
///
/// # Errors
///
/// Returns an error if the frame is empty or an OpenCV operation fails.
pub fn prepare_frame(frame: &Mat, mirror: bool, target_height: i32) -> Result<Mat> {
    let mut mirrored = Mat::default();
    let source = if mirror {
        core::flip(frame, &mut mirrored, 1)?;
        &mirrored
    } else {
        frame
    };

    let width = scaled_width(source.cols(), source.rows(), target_height)?;

    let mut resized = Mat::default();
    imgproc::resize(
        source,
        &mut resized,
        Size::new(width, target_height),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    Ok(resized)
}
