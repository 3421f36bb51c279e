//! Posture classification from literal landmark coordinates


use approx::assert_relative_eq;
use body_pose_classification::{
    classifier::{classify, evaluate_rules, Joint, JointAngles, JointConstraint, PoseLabel, PoseRule},
    landmarks::{Landmark, LandmarkSet, PoseLandmark},
    Error,
};
use proptest::prelude::*;
use test_helpers::{degenerate_landmarks, flexin_landmarks, t_plus_knee_landmarks, t_pose_landmarks};

#[test]
fn test_t_pose_angles() {
    let angles = JointAngles::from_landmarks(&t_pose_landmarks());

    assert_relative_eq!(angles.left_shoulder, 90.0, epsilon = 1e-9);
    assert_relative_eq!(angles.right_shoulder, 90.0, epsilon = 1e-9);
    assert_relative_eq!(angles.left_elbow, 180.0, epsilon = 1e-9);
    assert_relative_eq!(angles.right_elbow, 180.0, epsilon = 1e-9);
    assert_relative_eq!(angles.left_knee, 180.0, epsilon = 1e-9);
    assert_relative_eq!(angles.right_knee, 180.0, epsilon = 1e-9);
    assert_relative_eq!(angles.left_hip, 180.0, epsilon = 1e-9);
    assert_relative_eq!(angles.right_hip, 180.0, epsilon = 1e-9);
}

#[test]
fn test_canonical_t_pose() {
    assert_eq!(classify(&t_pose_landmarks()), PoseLabel::TPose);
}

#[test]
fn test_t_plus_knee_pose() {
    let landmarks = t_plus_knee_landmarks();
    let angles = JointAngles::from_landmarks(&landmarks);
    assert_relative_eq!(angles.left_knee, 270.0, epsilon = 1e-9);
    assert_relative_eq!(angles.left_hip, 180.0, epsilon = 1e-9);

    assert_eq!(classify(&landmarks), PoseLabel::TPlusKnee);
}

#[test]
fn test_flexin_pose() {
    let landmarks = flexin_landmarks();
    let angles = JointAngles::from_landmarks(&landmarks);
    assert_relative_eq!(angles.left_elbow, 90.0, epsilon = 1e-9);
    assert_relative_eq!(angles.right_elbow, 270.0, epsilon = 1e-9);

    assert_eq!(classify(&landmarks), PoseLabel::Flexin);
}

#[test]
fn test_degenerate_landmarks_are_unknown() {
    let landmarks = degenerate_landmarks();
    assert_eq!(JointAngles::from_landmarks(&landmarks), JointAngles::default());
    assert_eq!(classify(&landmarks), PoseLabel::Unknown);
}

#[test]
fn test_lowered_arms_are_unknown() {
    use PoseLandmark::*;
    // Arms hanging along the body: shoulders near 0°
    let landmarks = t_pose_landmarks()
        .with(LeftElbow, Landmark::planar(400.0, 300.0))
        .with(LeftWrist, Landmark::planar(400.0, 400.0))
        .with(RightElbow, Landmark::planar(240.0, 300.0))
        .with(RightWrist, Landmark::planar(240.0, 400.0));
    assert_eq!(classify(&landmarks), PoseLabel::Unknown);
}

#[test]
fn test_classification_is_deterministic() {
    for landmarks in [
        t_pose_landmarks(),
        t_plus_knee_landmarks(),
        flexin_landmarks(),
        degenerate_landmarks(),
    ] {
        let first = classify(&landmarks);
        for _ in 0..10 {
            assert_eq!(classify(&landmarks), first);
        }
    }
}

#[test]
fn test_later_rule_overwrites_earlier_match() {
    const STANDING: [JointConstraint; 1] = [JointConstraint::new(Joint::LeftKnee, 160.0, 205.0)];
    const STRAIGHT_ARMS: [JointConstraint; 1] = [JointConstraint::new(Joint::LeftElbow, 155.0, 205.0)];
    let rules = [
        PoseRule {
            label: PoseLabel::TPose,
            constraints: &STANDING,
        },
        PoseRule {
            label: PoseLabel::TPlusKnee,
            constraints: &STRAIGHT_ARMS,
        },
    ];

    let angles = JointAngles::from_landmarks(&t_pose_landmarks());
    assert_eq!(evaluate_rules(&rules, &angles), PoseLabel::TPlusKnee);
    assert_eq!(evaluate_rules(&rules[..1], &angles), PoseLabel::TPose);
    assert_eq!(evaluate_rules(&[], &angles), PoseLabel::Unknown);
}

#[test]
fn test_short_landmark_list_is_rejected() {
    let short = vec![Landmark::default(); 25];
    match LandmarkSet::from_landmarks(&short) {
        Err(Error::InvalidInput(msg)) => assert!(msg.contains("25")),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

fn jitter(landmarks: LandmarkSet, offsets: &[(f64, f64)]) -> LandmarkSet {
    use PoseLandmark::*;
    let joints = [
        LeftShoulder,
        LeftElbow,
        LeftWrist,
        LeftHip,
        LeftKnee,
        LeftAnkle,
        RightShoulder,
        RightElbow,
        RightWrist,
        RightHip,
        RightKnee,
        RightAnkle,
    ];
    joints
        .iter()
        .zip(offsets)
        .fold(landmarks, |set, (&joint, &(dx, dy))| {
            let p = *set.get(joint);
            set.with(joint, Landmark::new(p.x + dx, p.y + dy, p.z))
        })
}

proptest! {
    #[test]
    fn prop_small_jitter_keeps_t_pose(offsets in prop::collection::vec((-3.0f64..3.0, -3.0f64..3.0), 12)) {
        let landmarks = jitter(t_pose_landmarks(), &offsets);
        prop_assert_eq!(classify(&landmarks), PoseLabel::TPose);
    }

    #[test]
    fn prop_depth_is_ignored(z in -1000.0f64..1000.0) {
        use PoseLandmark::*;
        let p = *flexin_landmarks().get(LeftElbow);
        let landmarks = flexin_landmarks().with(LeftElbow, Landmark::new(p.x, p.y, z));
        prop_assert_eq!(classify(&landmarks), PoseLabel::Flexin);
    }
}
