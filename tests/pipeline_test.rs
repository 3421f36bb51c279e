//! Frame pipeline behavior with in-memory collaborators


use body_pose_classification::{
    classifier::PoseLabel,
    display::Headless,
    pipeline::{FrameOutcome, FramePipeline, PipelineSettings, SessionStats},
    Error,
};
use test_helpers::{
    degenerate_landmarks, flexin_landmarks, t_plus_knee_landmarks, t_pose_landmarks, ClosingSink, FailingSink,
    FixedDetector, RecordingSink, ScriptedDetector, ScriptedSource, StalledSink, StopAfter,
};
use tokio_util::sync::CancellationToken;

fn settings() -> PipelineSettings {
    PipelineSettings {
        mirror: true,
        frame_height: 640,
    }
}

#[tokio::test]
async fn test_publishes_one_label_per_frame() {
    let mut detector = FixedDetector::new(t_pose_landmarks());
    let mut sink = RecordingSink::default();

    let stats = FramePipeline::new(
        ScriptedSource::new(3),
        &mut detector,
        &mut sink,
        Headless,
        settings(),
        CancellationToken::new(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(sink.labels, vec![PoseLabel::TPose; 3]);
    assert_eq!(stats.published, 3);
    assert_eq!(stats.frames, 3);
    assert_eq!(detector.calls, 3);
}

#[tokio::test]
async fn test_no_body_publishes_nothing() {
    let mut sink = RecordingSink::default();

    let stats = FramePipeline::new(
        ScriptedSource::new(4),
        FixedDetector::empty(),
        &mut sink,
        Headless,
        settings(),
        CancellationToken::new(),
    )
    .run()
    .await
    .unwrap();

    assert!(sink.labels.is_empty());
    assert_eq!(stats.no_body, 4);
    assert_eq!(stats.published, 0);
}

#[tokio::test]
async fn test_unknown_pose_is_not_published() {
    let mut sink = RecordingSink::default();

    let stats = FramePipeline::new(
        ScriptedSource::new(2),
        FixedDetector::new(degenerate_landmarks()),
        &mut sink,
        Headless,
        settings(),
        CancellationToken::new(),
    )
    .run()
    .await
    .unwrap();

    assert!(sink.labels.is_empty());
    assert_eq!(stats.unclassified, 2);
}

#[tokio::test]
async fn test_publish_failure_does_not_stop_session() {
    let mut sink = FailingSink::default();

    let stats = FramePipeline::new(
        ScriptedSource::new(5),
        FixedDetector::new(flexin_landmarks()),
        &mut sink,
        Headless,
        settings(),
        CancellationToken::new(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(sink.attempts, 5);
    assert_eq!(stats.dropped, 5);
    assert_eq!(stats.frames, 5);
}

#[tokio::test]
async fn test_labels_follow_frames_in_order() {
    let detector = ScriptedDetector::new(vec![
        Ok(Some(t_pose_landmarks())),
        Ok(None),
        Ok(Some(t_plus_knee_landmarks())),
        Ok(Some(degenerate_landmarks())),
        Ok(Some(flexin_landmarks())),
    ]);
    let mut sink = RecordingSink::default();

    let stats = FramePipeline::new(
        ScriptedSource::new(5),
        detector,
        &mut sink,
        Headless,
        settings(),
        CancellationToken::new(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(
        sink.labels,
        vec![PoseLabel::TPose, PoseLabel::TPlusKnee, PoseLabel::Flexin]
    );
    assert_eq!(
        stats,
        SessionStats {
            frames: 5,
            skipped: 0,
            no_body: 1,
            unclassified: 1,
            published: 3,
            dropped: 0,
        }
    );
}

#[tokio::test]
async fn test_detector_errors_count_as_no_body() {
    let detector = ScriptedDetector::new(vec![
        Err(Error::InvalidInput("Expected 33 landmarks, got 12".to_string())),
        Err(Error::ModelOutputError("truncated output".to_string())),
        Ok(Some(t_pose_landmarks())),
    ]);
    let mut sink = RecordingSink::default();

    let stats = FramePipeline::new(
        ScriptedSource::new(3),
        detector,
        &mut sink,
        Headless,
        settings(),
        CancellationToken::new(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(stats.no_body, 2);
    assert_eq!(sink.labels, vec![PoseLabel::TPose]);
}

#[tokio::test]
async fn test_skipped_reads_continue() {
    let mut sink = RecordingSink::default();

    let stats = FramePipeline::new(
        ScriptedSource::from_script(vec![false, true, false, true]),
        FixedDetector::new(t_pose_landmarks()),
        &mut sink,
        Headless,
        settings(),
        CancellationToken::new(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.published, 2);
}

#[tokio::test]
async fn test_step_reports_outcome() {
    let mut sink = RecordingSink::default();
    let mut pipeline = FramePipeline::new(
        ScriptedSource::new(1),
        FixedDetector::new(t_plus_knee_landmarks()),
        &mut sink,
        Headless,
        settings(),
        CancellationToken::new(),
    );

    assert_eq!(pipeline.step().await.unwrap(), FrameOutcome::Published(PoseLabel::TPlusKnee));
    assert_eq!(pipeline.step().await.unwrap(), FrameOutcome::EndOfStream);
}

#[tokio::test]
async fn test_stop_key_ends_session() {
    let stop = CancellationToken::new();
    let mut sink = RecordingSink::default();

    let stats = FramePipeline::new(
        ScriptedSource::new(10),
        FixedDetector::new(t_pose_landmarks()),
        &mut sink,
        StopAfter::new(2),
        settings(),
        stop.clone(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(stats.frames, 2);
    assert_eq!(sink.labels.len(), 2);
    assert!(stop.is_cancelled());
}

#[tokio::test]
async fn test_cancelled_session_reads_nothing() {
    let stop = CancellationToken::new();
    stop.cancel();
    let mut detector = FixedDetector::new(t_pose_landmarks());
    let mut sink = RecordingSink::default();

    let stats = FramePipeline::new(
        ScriptedSource::new(10),
        &mut detector,
        &mut sink,
        Headless,
        settings(),
        stop,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(stats, SessionStats::default());
    assert_eq!(detector.calls, 0);
}

#[tokio::test]
async fn test_unmirrored_frames_are_processed() {
    let mut sink = RecordingSink::default();
    let settings = PipelineSettings {
        mirror: false,
        frame_height: 320,
    };

    let stats = FramePipeline::new(
        ScriptedSource::new(2),
        FixedDetector::new(t_pose_landmarks()),
        &mut sink,
        Headless,
        settings,
        CancellationToken::new(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(stats.published, 2);
}

#[tokio::test]
async fn test_cancellation_interrupts_stalled_send() {
    let stop = CancellationToken::new();
    let (mut sink, send_started) = StalledSink::new();

    let mut pipeline = FramePipeline::new(
        ScriptedSource::new(10),
        FixedDetector::new(t_pose_landmarks()),
        &mut sink,
        Headless,
        settings(),
        stop.clone(),
    );

    let cancel = async {
        send_started.await.unwrap();
        stop.cancel();
    };
    let (stats, ()) = tokio::join!(pipeline.run(), cancel);
    let stats = stats.unwrap();

    assert_eq!(stats.frames, 1);
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.published, 0);
}

#[tokio::test]
async fn test_disconnect_ends_session() {
    let stop = CancellationToken::new();
    let mut sink = ClosingSink {
        accepted: 2,
        ..ClosingSink::default()
    };

    let stats = FramePipeline::new(
        ScriptedSource::new(10),
        FixedDetector::new(t_pose_landmarks()),
        &mut sink,
        Headless,
        settings(),
        stop.clone(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(sink.labels.len(), 2);
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.published, 2);
    assert_eq!(stats.dropped, 1);
    // Only the session is over; the server token is untouched
    assert!(!stop.is_cancelled());
}
