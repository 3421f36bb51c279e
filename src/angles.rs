//! Joint angle calculation from three landmarks.
//!
//! The angle is measured at the vertex `b`, sweeping from the ray `b→a` to
//! the ray `b→c`, and is reported in degrees in `[0, 360)`. Only the image
//! plane is used; `z` never contributes.

use crate::{constants::FULL_TURN_DEGREES, landmarks::Landmark};

/// Calculate the signed joint angle at `b`, normalized to `[0, 360)`
///
/// Coincident points are not an error: `atan2(0, 0)` is `0`, so a
/// degenerate triple yields the angle of whichever ray is still defined.
#[must_use]
pub fn calculate_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let angle = ((c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x)).to_degrees();

    let angle = if angle < 0.0 { angle + FULL_TURN_DEGREES } else { angle };

    // A vanishing negative difference rounds up to a full turn
    if angle >= FULL_TURN_DEGREES {
        0.0
    } else {
        angle
    }
}
