//! Synthetic hands.
//!
//! Builds plausible 21-point skeletons for each [`HandPose`], upright with
//! the palm toward the camera.  The keyboard simulator feeds these to the
//! classifier in place of a real detector, and tests use them as fixtures.

use crate::{HandLandmarks, HandPose, Landmark, LANDMARK_COUNT, WRIST};
use crate::{THUMB_CMC, THUMB_MCP, THUMB_IP, THUMB_TIP, Finger};

/// Knuckle x offsets from the wrist, index → pinky.
const KNUCKLE_DX: [f32; 4] = [-0.045, -0.015, 0.015, 0.045];
/// Knuckle height above the wrist.
const PALM_LENGTH: f32 = 0.10;
/// Horizontal fingertip lean of the directional pointing poses.
const LEAN: f32 = 0.09;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Digit {
    Extended,
    /// Extended, with the tip shifted sideways by this much.
    Leaning(f32),
    Curled,
}

/// A skeleton that classifies as `pose` with the wrist at `(wrist_x, wrist_y)`.
///
/// `HandPose::None` yields a "victory" sign (index and middle up), which is
/// outside the vocabulary.
pub fn hand(pose: HandPose, wrist_x: f32, wrist_y: f32) -> HandLandmarks {
    use Digit::*;
    let digits = match pose {
        HandPose::OpenPalm      => [Extended, Extended, Extended, Extended],
        HandPose::Fist          => [Curled,   Curled,   Curled,   Curled  ],
        HandPose::Pointing      => [Extended, Curled,   Curled,   Curled  ],
        HandPose::IndexNext     => [Leaning(LEAN),  Curled, Curled, Curled],
        HandPose::IndexPrevious => [Leaning(-LEAN), Curled, Curled, Curled],
        HandPose::None          => [Extended, Extended, Curled,   Curled  ],
    };
    build(digits, wrist_x, wrist_y)
}

fn build(digits: [Digit; 4], wx: f32, wy: f32) -> HandLandmarks {
    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    pts[WRIST] = Landmark::new(wx, wy, 0.0);

    // Thumb rests beside the palm; the classifier never looks at it.
    pts[THUMB_CMC] = Landmark::new(wx - 0.04, wy - 0.02, 0.0);
    pts[THUMB_MCP] = Landmark::new(wx - 0.07, wy - 0.05, 0.0);
    pts[THUMB_IP]  = Landmark::new(wx - 0.09, wy - 0.07, 0.0);
    pts[THUMB_TIP] = Landmark::new(wx - 0.10, wy - 0.09, 0.0);

    for (finger, (digit, dx)) in Finger::ALL.iter().zip(digits.iter().zip(KNUCKLE_DX)) {
        let mx = wx + dx;
        let my = wy - PALM_LENGTH;
        // (x shift, y offset from knuckle) for PIP, DIP, tip.
        let joints: [(f32, f32); 3] = match *digit {
            Digit::Extended    => [(0.0, -0.045), (0.0, -0.08), (0.0, -0.11)],
            Digit::Leaning(l)  => [(l * 0.4, -0.045), (l * 0.7, -0.08), (l, -0.11)],
            Digit::Curled      => [(0.0, -0.035), (0.0, -0.015), (0.0, 0.02)],
        };
        let base = finger.mcp();
        pts[base] = Landmark::new(mx, my, 0.0);
        for (k, (jx, jy)) in joints.iter().enumerate() {
            pts[base + 1 + k] = Landmark::new(mx + jx, my + jy, 0.0);
        }
    }

    HandLandmarks::new(pts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{INDEX_TIP, INDEX_MCP};

    #[test]
    fn wrist_lands_where_requested() {
        let h = hand(HandPose::Fist, 0.25, 0.75);
        assert_eq!(h.wrist(), Landmark::new(0.25, 0.75, 0.0));
    }

    #[test]
    fn leaning_pointer_shifts_tip_only_sideways() {
        let h = hand(HandPose::IndexNext, 0.5, 0.5);
        let lean = h.point(INDEX_TIP).x - h.point(INDEX_MCP).x;
        assert!((lean - LEAN).abs() < 1e-6);
        let p = hand(HandPose::IndexPrevious, 0.5, 0.5);
        assert!(p.point(INDEX_TIP).x < p.point(INDEX_MCP).x);
    }
}
