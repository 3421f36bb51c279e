//! Per-frame processing loop.
//!
//! One session reads frames strictly in order: acquire, mirror and resize,
//! detect, classify, publish, render. The only suspension point is the hand-off
//! of a label to the [`LabelSink`]; every other step runs to completion before
//! the next frame is read. That hand-off is raced against the stop token, so a
//! subscriber that stops reading cannot hold the session open. No state
//! survives from one frame to the next apart from the FPS counter and session
//! statistics.

use crate::{
    camera::{prepare_frame, FrameRead, FrameSource},
    classifier::{classify, PoseLabel},
    detection::PoseDetector,
    display::{FpsCounter, FrameAnnotation, FrameView},
    publisher::LabelSink,
    Error, Result,
};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

/// What happened to one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The source produced nothing this iteration
    NoFrame,
    /// The source is exhausted
    EndOfStream,
    /// No body was found
    NoBody,
    /// A body was found but matched no rule
    Unclassified,
    /// The label reached the sink
    Published(PoseLabel),
    /// The label was classified but delivery failed
    Dropped(PoseLabel),
    /// The subscriber went away; the session ends
    Disconnected(PoseLabel),
}

/// Frame processing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    /// Mirror frames horizontally before detection
    pub mirror: bool,
    /// Height every frame is resized to
    pub frame_height: i32,
}

/// Counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub skipped: u64,
    pub no_body: u64,
    pub unclassified: u64,
    pub published: u64,
    pub dropped: u64,
}

impl SessionStats {
    fn record(&mut self, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::NoFrame => self.skipped += 1,
            FrameOutcome::EndOfStream => return,
            FrameOutcome::NoBody => self.no_body += 1,
            FrameOutcome::Unclassified => self.unclassified += 1,
            FrameOutcome::Published(_) => self.published += 1,
            FrameOutcome::Dropped(_) | FrameOutcome::Disconnected(_) => self.dropped += 1,
        }
        self.frames += 1;
    }
}

/// One capture-to-subscriber session
pub struct FramePipeline<S, D, P, V> {
    source: S,
    detector: D,
    sink: P,
    view: V,
    settings: PipelineSettings,
    stop: CancellationToken,
    fps: FpsCounter,
    stats: SessionStats,
}

impl<S, D, P, V> FramePipeline<S, D, P, V>
where
    S: FrameSource,
    D: PoseDetector,
    P: LabelSink,
    V: FrameView,
{
    pub fn new(source: S, detector: D, sink: P, view: V, settings: PipelineSettings, stop: CancellationToken) -> Self {
        Self {
            source,
            detector,
            sink,
            view,
            settings,
            stop,
            fps: FpsCounter::new(),
            stats: SessionStats::default(),
        }
    }

    /// Process frames until the stop key, cancellation, end of stream or the
    /// subscriber disconnecting
    ///
    /// # Errors
    ///
    /// Returns an error only for failures outside the per-frame taxonomy, such
    /// as the capture backend or preview window failing.
    pub async fn run(&mut self) -> Result<SessionStats> {
        info!("Starting frame pipeline");

        while !self.stop.is_cancelled() {
            let outcome = self.step().await?;
            self.stats.record(outcome);

            if matches!(outcome, FrameOutcome::EndOfStream | FrameOutcome::Disconnected(_)) {
                break;
            }
            if self.view.stop_requested()? {
                self.stop.cancel();
                break;
            }
        }

        info!("Frame pipeline stopped: {:?}", self.stats);
        Ok(self.stats)
    }

    /// Process exactly one frame
    ///
    /// # Errors
    ///
    /// Returns an error if reading, resizing or rendering fails.
    pub async fn step(&mut self) -> Result<FrameOutcome> {
        let raw = match self.source.read_frame()? {
            FrameRead::Frame(frame) => frame,
            FrameRead::Skipped => return Ok(FrameOutcome::NoFrame),
            FrameRead::Finished => return Ok(FrameOutcome::EndOfStream),
        };

        let frame = prepare_frame(&raw, self.settings.mirror, self.settings.frame_height)?;
        let fps = self.fps.tick();

        let landmarks = match self.detector.detect(&frame) {
            Ok(landmarks) => landmarks,
            Err(Error::InvalidInput(msg)) => {
                debug!("Malformed landmarks treated as no detection: {}", msg);
                None
            }
            Err(e) => {
                warn!("Pose detection failed: {}", e);
                None
            }
        };

        let (outcome, label) = match &landmarks {
            None => (FrameOutcome::NoBody, None),
            Some(landmarks) => {
                let label = classify(landmarks);
                (self.deliver(label).await, Some(label))
            }
        };

        let annotation = FrameAnnotation {
            landmarks: landmarks.as_ref(),
            label,
            fps,
        };
        self.view.render(&frame, &annotation)?;

        Ok(outcome)
    }

    async fn deliver(&mut self, label: PoseLabel) -> FrameOutcome {
        if !label.is_known() {
            return FrameOutcome::Unclassified;
        }

        let result = tokio::select! {
            () = self.stop.cancelled() => {
                warn!("Dropped {}: session stopped during send", label);
                return FrameOutcome::Dropped(label);
            }
            result = self.sink.publish(label) => result,
        };

        match result {
            Ok(()) => {
                info!("Published {}", label);
                FrameOutcome::Published(label)
            }
            Err(Error::Disconnected(reason)) => {
                info!("Subscriber disconnected: {}", reason);
                FrameOutcome::Disconnected(label)
            }
            Err(e) => {
                warn!("Dropped {}: {}", label, e);
                FrameOutcome::Dropped(label)
            }
        }
    }
}
