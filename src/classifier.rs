//! Angle-based posture classification.
//!
//! Eight joint angles are derived from a [`LandmarkSet`] and checked against
//! a fixed, ordered rule table. Rules are evaluated first to last and every
//! matching rule replaces the label chosen so far, so the last match wins.
//! A frame that matches nothing is [`PoseLabel::Unknown`].

use crate::{
    angles::calculate_angle,
    landmarks::{LandmarkSet, PoseLandmark},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Posture vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoseLabel {
    #[serde(rename = "Unknown Pose")]
    Unknown,
    #[serde(rename = "T Pose")]
    TPose,
    #[serde(rename = "T + Knee Pose")]
    TPlusKnee,
    #[serde(rename = "Flexin Pose")]
    Flexin,
}

impl PoseLabel {
    pub const ALL: [PoseLabel; 4] = [Self::Unknown, Self::TPose, Self::TPlusKnee, Self::Flexin];

    /// Wire and display text of the label
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown Pose",
            Self::TPose => "T Pose",
            Self::TPlusKnee => "T + Knee Pose",
            Self::Flexin => "Flexin Pose",
        }
    }

    /// Whether any rule matched
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl fmt::Display for PoseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Joint whose angle a rule can constrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    LeftElbow,
    RightElbow,
    LeftShoulder,
    RightShoulder,
    LeftKnee,
    RightKnee,
    LeftHip,
    RightHip,
}

/// Per-frame joint angles in degrees, each in `[0, 360)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles {
    pub left_elbow: f64,
    pub right_elbow: f64,
    pub left_shoulder: f64,
    pub right_shoulder: f64,
    pub left_knee: f64,
    pub right_knee: f64,
    pub left_hip: f64,
    pub right_hip: f64,
}

impl JointAngles {
    /// Compute all joint angles of one body
    #[must_use]
    pub fn from_landmarks(landmarks: &LandmarkSet) -> Self {
        use PoseLandmark::*;
        let angle = |a, b, c| calculate_angle(landmarks.get(a), landmarks.get(b), landmarks.get(c));

        Self {
            left_elbow: angle(LeftShoulder, LeftElbow, LeftWrist),
            right_elbow: angle(RightShoulder, RightElbow, RightWrist),
            left_shoulder: angle(LeftElbow, LeftShoulder, LeftHip),
            right_shoulder: angle(RightHip, RightShoulder, RightElbow),
            left_knee: angle(LeftHip, LeftKnee, LeftAnkle),
            right_knee: angle(RightHip, RightKnee, RightAnkle),
            left_hip: angle(LeftShoulder, LeftHip, LeftAnkle),
            right_hip: angle(RightShoulder, RightHip, RightAnkle),
        }
    }

    pub fn get(&self, joint: Joint) -> f64 {
        match joint {
            Joint::LeftElbow => self.left_elbow,
            Joint::RightElbow => self.right_elbow,
            Joint::LeftShoulder => self.left_shoulder,
            Joint::RightShoulder => self.right_shoulder,
            Joint::LeftKnee => self.left_knee,
            Joint::RightKnee => self.right_knee,
            Joint::LeftHip => self.left_hip,
            Joint::RightHip => self.right_hip,
        }
    }
}

/// Open interval of angles in degrees; both ends are excluded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub low: f64,
    pub high: f64,
}

impl AngleRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle > self.low && angle < self.high
    }
}

/// One joint that must lie inside a range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointConstraint {
    pub joint: Joint,
    pub range: AngleRange,
}

impl JointConstraint {
    pub const fn new(joint: Joint, low: f64, high: f64) -> Self {
        Self {
            joint,
            range: AngleRange::new(low, high),
        }
    }

    fn holds(&self, angles: &JointAngles) -> bool {
        self.range.contains(angles.get(self.joint))
    }
}

/// A label and the conjunction of constraints that selects it
#[derive(Debug, Clone, Copy)]
pub struct PoseRule {
    pub label: PoseLabel,
    pub constraints: &'static [JointConstraint],
}

impl PoseRule {
    pub fn matches(&self, angles: &JointAngles) -> bool {
        self.constraints.iter().all(|c| c.holds(angles))
    }
}

const T_POSE: [JointConstraint; 8] = [
    JointConstraint::new(Joint::LeftShoulder, 70.0, 120.0),
    JointConstraint::new(Joint::RightShoulder, 70.0, 120.0),
    JointConstraint::new(Joint::LeftElbow, 155.0, 205.0),
    JointConstraint::new(Joint::RightElbow, 155.0, 205.0),
    JointConstraint::new(Joint::LeftKnee, 160.0, 205.0),
    JointConstraint::new(Joint::RightKnee, 160.0, 205.0),
    JointConstraint::new(Joint::LeftHip, 170.0, 190.0),
    JointConstraint::new(Joint::RightHip, 170.0, 190.0),
];

const T_PLUS_KNEE_POSE: [JointConstraint; 6] = [
    JointConstraint::new(Joint::LeftShoulder, 70.0, 120.0),
    JointConstraint::new(Joint::RightShoulder, 70.0, 120.0),
    JointConstraint::new(Joint::LeftElbow, 155.0, 205.0),
    JointConstraint::new(Joint::RightElbow, 155.0, 205.0),
    JointConstraint::new(Joint::LeftKnee, 240.0, 300.0),
    JointConstraint::new(Joint::LeftHip, 130.0, 220.0),
];

const FLEXIN_POSE: [JointConstraint; 8] = [
    JointConstraint::new(Joint::LeftShoulder, 70.0, 120.0),
    JointConstraint::new(Joint::RightShoulder, 70.0, 120.0),
    JointConstraint::new(Joint::LeftElbow, 50.0, 120.0),
    JointConstraint::new(Joint::RightElbow, 230.0, 310.0),
    JointConstraint::new(Joint::LeftKnee, 150.0, 205.0),
    JointConstraint::new(Joint::RightKnee, 150.0, 205.0),
    JointConstraint::new(Joint::LeftHip, 170.0, 190.0),
    JointConstraint::new(Joint::RightHip, 170.0, 190.0),
];

/// The posture rules in evaluation order.
///
/// `TPlusKnee` follows `TPose` and replaces it whenever both match.
pub const POSE_RULES: [PoseRule; 3] = [
    PoseRule {
        label: PoseLabel::TPose,
        constraints: &T_POSE,
    },
    PoseRule {
        label: PoseLabel::TPlusKnee,
        constraints: &T_PLUS_KNEE_POSE,
    },
    PoseRule {
        label: PoseLabel::Flexin,
        constraints: &FLEXIN_POSE,
    },
];

/// Run `rules` in order; the last matching rule decides the label
#[must_use]
pub fn evaluate_rules(rules: &[PoseRule], angles: &JointAngles) -> PoseLabel {
    rules.iter().fold(PoseLabel::Unknown, |label, rule| {
        if rule.matches(angles) {
            rule.label
        } else {
            label
        }
    })
}

/// Classify precomputed joint angles against [`POSE_RULES`]
#[must_use]
pub fn classify_angles(angles: &JointAngles) -> PoseLabel {
    evaluate_rules(&POSE_RULES, angles)
}

/// Classify one body
#[must_use]
pub fn classify(landmarks: &LandmarkSet) -> PoseLabel {
    classify_angles(&JointAngles::from_landmarks(landmarks))
}
