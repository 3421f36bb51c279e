//! Body landmark detection.
//!
//! [`PoseDetector`] is the seam between the pipeline and whatever produces
//! landmarks. [`OnnxPoseDetector`] runs a 33-point landmark model through
//! ONNX Runtime; tests substitute fixed landmark fixtures.

use crate::{
    constants::{LANDMARK_MODEL_STRIDE, NUM_POSE_LANDMARKS},
    landmarks::{Landmark, LandmarkSet},
    utils::safe_cast::usize_to_i32,
    Error, Result,
};
use ndarray::{Array4, CowArray};
use opencv::core::{Mat, Size, CV_32F};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Produces the landmarks of the body visible in a frame
pub trait PoseDetector {
    /// Detect a body in `frame`
    ///
    /// Returns `Ok(None)` when no body is present.
    fn detect(&mut self, frame: &Mat) -> Result<Option<LandmarkSet>>;
}

impl<D: PoseDetector + ?Sized> PoseDetector for &mut D {
    fn detect(&mut self, frame: &Mat) -> Result<Option<LandmarkSet>> {
        (**self).detect(frame)
    }
}

impl<D: PoseDetector + ?Sized> PoseDetector for Box<D> {
    fn detect(&mut self, frame: &Mat) -> Result<Option<LandmarkSet>> {
        (**self).detect(frame)
    }
}

/// Full-body landmark model run through `ONNX` Runtime
///
/// The model takes a square RGB image in `[0, 1]` (NHWC) and emits one row of
/// `x, y, z, visibility, presence` per landmark in input-pixel units, plus a
/// pose presence logit.
pub struct OnnxPoseDetector {
    session: Session,
    input_size: i32,
    min_detection_confidence: f32,
}

impl OnnxPoseDetector {
    /// Load the landmark model
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The ONNX model file cannot be loaded
    /// - The model has no inputs or outputs
    /// - The ONNX runtime environment cannot be created
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: i32, min_detection_confidence: f32) -> Result<Self> {
        log::info!(
            "Initializing OnnxPoseDetector with model: {}",
            model_path.as_ref().display()
        );
        if input_size <= 0 {
            return Err(Error::InvalidInput(format!("Model input size must be positive, got {input_size}")));
        }

        let environment = Arc::new(
            Environment::builder()
                .with_name("pose_landmarks")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let session = ort::SessionBuilder::new(&environment)?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
            .with_model_from_file(model_path)?;

        if session.inputs.is_empty() {
            return Err(Error::ModelError("Model has no inputs".to_string()));
        }
        if session.outputs.len() < 2 {
            return Err(Error::ModelError(format!(
                "Expected landmark and presence outputs, model has {}",
                session.outputs.len()
            )));
        }

        Ok(Self {
            session,
            input_size,
            min_detection_confidence,
        })
    }

    /// Resize and normalize a BGR frame into the model's input tensor
    #[allow(clippy::cast_sign_loss)] // input_size is validated positive
    fn preprocess(&self, frame: &Mat) -> Result<Array4<f32>> {
        let size = self.input_size as usize;

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let mut float_image = Mat::default();
        rgb.convert_to(&mut float_image, CV_32F, 1.0 / 255.0, 0.0)?;

        let mut tensor = Array4::<f32>::zeros((1, size, size, 3));
        for row in 0..size {
            for col in 0..size {
                let pixel = float_image.at_2d::<opencv::core::Vec3f>(usize_to_i32(row)?, usize_to_i32(col)?)?;
                for ch in 0..3 {
                    tensor[[0, row, col, ch]] = pixel[ch];
                }
            }
        }

        Ok(tensor)
    }

    /// Run the model and return every output flattened
    fn forward(&self, input: Array4<f32>) -> Result<Vec<Vec<f32>>> {
        let cow_array = CowArray::from(input.into_dyn());
        let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

        let outputs = self.session.run(vec![input_tensor])?;

        outputs
            .iter()
            .map(|output| -> Result<Vec<f32>> {
                let tensor = output.try_extract::<f32>()?;
                let view = tensor.view();
                Ok(view.iter().copied().collect())
            })
            .collect()
    }
}

impl PoseDetector for OnnxPoseDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Option<LandmarkSet>> {
        let input = self.preprocess(frame)?;
        let outputs = self.forward(input)?;

        let landmark_rows = outputs
            .iter()
            .find(|o| o.len() >= NUM_POSE_LANDMARKS * LANDMARK_MODEL_STRIDE)
            .ok_or_else(|| Error::ModelOutputError("No landmark output found".to_string()))?;
        let presence_logit = outputs
            .iter()
            .find(|o| o.len() == 1)
            .and_then(|o| o.first().copied())
            .ok_or_else(|| Error::ModelOutputError("No pose presence output found".to_string()))?;

        let frame_size = (f64::from(frame.cols()), f64::from(frame.rows()));
        decode_landmarks(
            landmark_rows,
            sigmoid(presence_logit),
            self.min_detection_confidence,
            f64::from(self.input_size),
            frame_size,
        )
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Turn raw model rows into pixel-space landmarks
///
/// `x` and `y` are scaled from model-input pixels to frame pixels and
/// truncated to whole pixels; `z` is scaled by the frame width. Extra rows
/// beyond the body topology (auxiliary ROI points) are ignored.
///
/// # Errors
///
/// Returns `Error::ModelOutputError` if fewer than 33 rows are present.
pub fn decode_landmarks(
    rows: &[f32],
    presence: f32,
    min_detection_confidence: f32,
    input_size: f64,
    (frame_width, frame_height): (f64, f64),
) -> Result<Option<LandmarkSet>> {
    if presence < min_detection_confidence {
        return Ok(None);
    }
    if rows.len() < NUM_POSE_LANDMARKS * LANDMARK_MODEL_STRIDE {
        return Err(Error::ModelOutputError(format!(
            "Expected at least {} landmark values, got {}",
            NUM_POSE_LANDMARKS * LANDMARK_MODEL_STRIDE,
            rows.len()
        )));
    }

    let landmarks: Vec<Landmark> = rows
        .chunks_exact(LANDMARK_MODEL_STRIDE)
        .take(NUM_POSE_LANDMARKS)
        .map(|row| {
            let x = f64::from(row[0]) / input_size;
            let y = f64::from(row[1]) / input_size;
            let z = f64::from(row[2]) / input_size;
            Landmark::new((x * frame_width).trunc(), (y * frame_height).trunc(), z * frame_width)
        })
        .collect();

    LandmarkSet::from_landmarks(&landmarks).map(Some)
}
