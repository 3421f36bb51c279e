//! Annotated preview window and the interactive stop key.

use crate::{
    classifier::PoseLabel,
    constants::{KEY_ESC, KEY_QUIT},
    landmarks::{LandmarkSet, POSE_CONNECTIONS},
    utils::safe_cast::f64_to_i32_clamp,
    Result,
};
use log::{info, warn};
use opencv::{
    core::{Mat, Point, Scalar},
    highgui::{self, WINDOW_NORMAL},
    imgproc::{self, FONT_HERSHEY_PLAIN, LINE_8},
    prelude::*,
};
use std::time::Instant;

const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const RED: (f64, f64, f64) = (0.0, 0.0, 255.0);
const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);

fn bgr((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

/// What the pipeline knows about a frame once it has been processed
#[derive(Debug, Clone, Copy)]
pub struct FrameAnnotation<'a> {
    pub landmarks: Option<&'a LandmarkSet>,
    pub label: Option<PoseLabel>,
    pub fps: f64,
}

/// Presents processed frames and reports the user's stop request
pub trait FrameView {
    /// Show `frame` with its annotation
    fn render(&mut self, frame: &Mat, annotation: &FrameAnnotation<'_>) -> Result<()>;

    /// Whether the user asked to stop since the last call
    fn stop_requested(&mut self) -> Result<bool>;
}

impl<V: FrameView + ?Sized> FrameView for Box<V> {
    fn render(&mut self, frame: &Mat, annotation: &FrameAnnotation<'_>) -> Result<()> {
        (**self).render(frame, annotation)
    }

    fn stop_requested(&mut self) -> Result<bool> {
        (**self).stop_requested()
    }
}

/// No window; sessions end only through cancellation or end of stream
#[derive(Debug, Default)]
pub struct Headless;

impl FrameView for Headless {
    fn render(&mut self, _frame: &Mat, _annotation: &FrameAnnotation<'_>) -> Result<()> {
        Ok(())
    }

    fn stop_requested(&mut self) -> Result<bool> {
        Ok(false)
    }
}

/// `OpenCV` HighGUI window; ESC or `q` stops the session
pub struct PreviewWindow {
    name: String,
    show_fps: bool,
    draw_landmarks: bool,
}

impl PreviewWindow {
    /// Create a resizable window
    ///
    /// # Errors
    ///
    /// Returns an error if HighGUI cannot create the window.
    pub fn new(name: &str, show_fps: bool, draw_landmarks: bool) -> Result<Self> {
        highgui::named_window(name, WINDOW_NORMAL)?;
        Ok(Self {
            name: name.to_string(),
            show_fps,
            draw_landmarks,
        })
    }

    fn draw_skeleton(frame: &mut Mat, landmarks: &LandmarkSet) -> Result<()> {
        let (max_x, max_y) = (frame.cols() - 1, frame.rows() - 1);
        let point = |landmark: &crate::landmarks::Landmark| {
            Point::new(
                f64_to_i32_clamp(landmark.x, 0, max_x),
                f64_to_i32_clamp(landmark.y, 0, max_y),
            )
        };

        for (a, b) in POSE_CONNECTIONS {
            imgproc::line(
                frame,
                point(landmarks.get(a)),
                point(landmarks.get(b)),
                bgr(WHITE),
                2,
                LINE_8,
                0,
            )?;
        }
        for landmark in landmarks.iter() {
            imgproc::circle(frame, point(landmark), 3, bgr(RED), -1, LINE_8, 0)?;
        }
        Ok(())
    }
}

impl FrameView for PreviewWindow {
    fn render(&mut self, frame: &Mat, annotation: &FrameAnnotation<'_>) -> Result<()> {
        let mut display_frame = frame.clone();

        if self.draw_landmarks {
            if let Some(landmarks) = annotation.landmarks {
                Self::draw_skeleton(&mut display_frame, landmarks)?;
            }
        }

        if let Some(label) = annotation.label {
            let color = if label.is_known() { GREEN } else { RED };
            imgproc::put_text(
                &mut display_frame,
                label.as_str(),
                Point::new(10, 30),
                FONT_HERSHEY_PLAIN,
                2.0,
                bgr(color),
                2,
                LINE_8,
                false,
            )?;
        }

        if self.show_fps {
            imgproc::put_text(
                &mut display_frame,
                &format!("FPS: {}", annotation.fps as i64),
                Point::new(10, 60),
                FONT_HERSHEY_PLAIN,
                2.0,
                bgr(GREEN),
                3,
                LINE_8,
                false,
            )?;
        }

        highgui::imshow(&self.name, &display_frame)?;
        Ok(())
    }

    fn stop_requested(&mut self) -> Result<bool> {
        let key = highgui::wait_key(1)? & 0xFF;
        if key == KEY_ESC || key == KEY_QUIT {
            info!("Exit requested by user");
            return Ok(true);
        }
        Ok(false)
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.name) {
            warn!("Failed to close window {}: {}", self.name, e);
        }
    }
}

/// Frames per second from the spacing of consecutive frames
#[derive(Debug, Default)]
pub struct FpsCounter {
    last: Option<Instant>,
    fps: f64,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now` and return the current rate
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        if let Some(last) = self.last {
            let elapsed = now.duration_since(last).as_secs_f64();
            if elapsed > 0.0 {
                self.fps = 1.0 / elapsed;
            }
        }
        self.last = Some(now);
        self.fps
    }

    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }
}
