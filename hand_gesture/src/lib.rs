//! # hand_gesture
//!
//! Turns one frame's worth of 21-point hand landmarks into categorical
//! gestures:
//!
//! * **Static pose** ([`HandPose`]): open palm, fist, pointing, and the two
//!   lateral pointing refinements used for browsing.
//! * **Swipe** ([`SwipeEvent`]): a debounced horizontal wrist movement.
//!
//! Landmarks follow the MediaPipe hand layout: index 0 is the wrist, then
//! four points per digit (thumb, index, middle, ring, pinky) from the base
//! joint to the tip.  Coordinates are normalised image coordinates with `y`
//! growing downward.
//!
//! Classification is a pure function of its inputs.  Time only enters through
//! the explicit `now` argument of the swipe tracker, so tests can drive it
//! with a fake clock.
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use hand_gesture::{GestureClassifier, GestureConfig, HandFrame, HandPose, Handedness, synth};
//!
//! let mut classifier = GestureClassifier::new(GestureConfig::default());
//! let frame = HandFrame::default()
//!     .with_hand(Handedness::Left, synth::hand(HandPose::OpenPalm, 0.3, 0.6));
//!
//! let gestures = classifier.classify_frame(&frame, Duration::ZERO);
//! assert_eq!(gestures.left, HandPose::OpenPalm);
//! assert_eq!(gestures.right, HandPose::None);
//! ```

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

pub mod synth;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks per detected hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

// ════════════════════════════════════════════════════════════════════════════
// Landmark data
// ════════════════════════════════════════════════════════════════════════════

/// One normalised landmark point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self { Landmark { x, y, z } }

    /// Distance in the image plane.  Depth is ignored because detectors
    /// report it on a different, much noisier scale.
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("expected 21 hand landmarks, got {0}")]
    WrongCount(usize),
}

/// The full 21-point skeleton of one hand.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        HandLandmarks { points }
    }

    /// Build from a detector's variable-length output.
    pub fn from_slice(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::WrongCount(points.len()))?;
        Ok(HandLandmarks { points })
    }

    pub fn point(&self, index: usize) -> Landmark { self.points[index] }
    pub fn wrist(&self) -> Landmark { self.points[WRIST] }
    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] { &self.points }
}

/// Which hand a detection belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness { Left, Right }

/// A single hand reported by the detector.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedHand {
    pub handedness: Handedness,
    pub landmarks:  HandLandmarks,
}

/// Everything the detector saw in one camera frame: zero, one, or two hands.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandFrame {
    pub hands: Vec<TrackedHand>,
}

impl HandFrame {
    /// Add (or replace) the hand with the given handedness.
    pub fn with_hand(mut self, handedness: Handedness, landmarks: HandLandmarks) -> Self {
        self.hands.retain(|h| h.handedness != handedness);
        self.hands.push(TrackedHand { handedness, landmarks });
        self
    }

    /// First hand with the requested handedness, if any.
    pub fn hand(&self, handedness: Handedness) -> Option<&HandLandmarks> {
        self.hands.iter()
            .find(|h| h.handedness == handedness)
            .map(|h| &h.landmarks)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Fingers
// ════════════════════════════════════════════════════════════════════════════

/// The four non-thumb fingers inspected by the pose classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finger { Index, Middle, Ring, Pinky }

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// Knuckle (metacarpophalangeal joint).
    pub fn mcp(self) -> usize {
        match self {
            Finger::Index  => INDEX_MCP,
            Finger::Middle => MIDDLE_MCP,
            Finger::Ring   => RING_MCP,
            Finger::Pinky  => PINKY_MCP,
        }
    }

    /// Proximal interphalangeal joint.
    pub fn pip(self) -> usize { self.mcp() + 1 }

    pub fn tip(self) -> usize { self.mcp() + 3 }
}

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// Classification thresholds.  The defaults are tuned by hand and carry no
/// meaning beyond "works with a webcam at arm's length".
#[derive(Clone, Debug, PartialEq)]
pub struct GestureConfig {
    /// A finger is extended when wrist→tip exceeds wrist→PIP times this.
    pub extension_ratio: f32,
    /// Horizontal tip-to-knuckle offset that turns Pointing into a
    /// directional IndexNext / IndexPrevious.
    pub pointing_offset: f32,
    /// Minimum wrist x displacement between two calls to count as a swipe.
    pub swipe_threshold: f32,
    /// Minimum time between two accepted swipes.
    pub swipe_cooldown:  Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            extension_ratio: 1.0,
            pointing_offset: 0.06,
            swipe_threshold: 0.08,
            swipe_cooldown:  Duration::from_millis(800),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Static pose
// ════════════════════════════════════════════════════════════════════════════

/// Categorical hand pose, recomputed every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum HandPose {
    /// No hand, or a finger combination outside the vocabulary.
    #[default]
    None,
    /// All four fingers extended.
    OpenPalm,
    /// No finger extended.
    Fist,
    /// Only the index finger extended, held upright.
    Pointing,
    /// Pointing, with the fingertip leaning toward +x.
    IndexNext,
    /// Pointing, with the fingertip leaning toward −x.
    IndexPrevious,
}

impl HandPose {
    pub fn name(self) -> &'static str {
        match self {
            HandPose::None          => "none",
            HandPose::OpenPalm      => "open palm",
            HandPose::Fist          => "fist",
            HandPose::Pointing      => "pointing",
            HandPose::IndexNext     => "index next",
            HandPose::IndexPrevious => "index previous",
        }
    }
}

/// Whether `finger` is straightened away from the wrist.
pub fn finger_extended(hand: &HandLandmarks, finger: Finger, config: &GestureConfig) -> bool {
    let wrist = hand.wrist();
    let tip   = wrist.planar_distance(&hand.point(finger.tip()));
    let pip   = wrist.planar_distance(&hand.point(finger.pip()));
    tip > pip * config.extension_ratio
}

/// Classify one hand's static pose.
pub fn classify_hand(hand: &HandLandmarks, config: &GestureConfig) -> HandPose {
    let extended = Finger::ALL.map(|f| finger_extended(hand, f, config));

    match extended {
        [true,  true,  true,  true ] => HandPose::OpenPalm,
        [false, false, false, false] => HandPose::Fist,
        [true,  false, false, false] => refine_pointing(hand, config),
        _                            => HandPose::None,
    }
}

/// Split Pointing by the lateral lean of the index finger.
fn refine_pointing(hand: &HandLandmarks, config: &GestureConfig) -> HandPose {
    let offset = hand.point(INDEX_TIP).x - hand.point(INDEX_MCP).x;
    if offset > config.pointing_offset {
        HandPose::IndexNext
    } else if offset < -config.pointing_offset {
        HandPose::IndexPrevious
    } else {
        HandPose::Pointing
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Swipe
// ════════════════════════════════════════════════════════════════════════════

/// Dynamic horizontal gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SwipeEvent {
    #[default]
    None,
    /// Wrist moved toward −x.
    SwingLeft,
    /// Wrist moved toward +x.
    SwingRight,
}

/// Tracks wrist x across calls and emits debounced swipes.
#[derive(Clone, Debug)]
pub struct SwipeTracker {
    threshold:  f32,
    cooldown:   Duration,
    last_x:     Option<f32>,
    last_swipe: Option<Duration>,
}

impl SwipeTracker {
    pub fn new(config: &GestureConfig) -> Self {
        SwipeTracker {
            threshold:  config.swipe_threshold,
            cooldown:   config.swipe_cooldown,
            last_x:     None,
            last_swipe: None,
        }
    }

    /// Compare this wrist position with the previous one.
    ///
    /// The tracked x is replaced on every call, so slow drift never adds up
    /// to a swipe.  The very first observation only seeds the tracker.
    pub fn classify_swipe(&mut self, hand: &HandLandmarks, now: Duration) -> SwipeEvent {
        let x = hand.wrist().x;
        let previous = self.last_x.replace(x);

        let Some(previous) = previous else { return SwipeEvent::None };
        let dx = x - previous;
        if dx.abs() <= self.threshold {
            return SwipeEvent::None;
        }

        let cooled = self.last_swipe
            .map_or(true, |t| now.saturating_sub(t) >= self.cooldown);
        if !cooled {
            return SwipeEvent::None;
        }

        self.last_swipe = Some(now);
        if dx > 0.0 { SwipeEvent::SwingRight } else { SwipeEvent::SwingLeft }
    }

    /// Forget the tracked position (hand left the frame).  The cooldown
    /// clock survives so a hand re-entering cannot bypass it.
    pub fn reset(&mut self) {
        self.last_x = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Per-frame classification
// ════════════════════════════════════════════════════════════════════════════

/// Everything the navigation layer needs from one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameGestures {
    pub left:  HandPose,
    pub right: HandPose,
    /// Swipe of the right (browsing) hand.
    pub swipe: SwipeEvent,
}

/// Stateful wrapper: pose classification for both hands plus the swipe
/// tracker for the right hand.
#[derive(Clone, Debug)]
pub struct GestureClassifier {
    config: GestureConfig,
    swipe:  SwipeTracker,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        let swipe = SwipeTracker::new(&config);
        GestureClassifier { config, swipe }
    }

    pub fn config(&self) -> &GestureConfig { &self.config }

    pub fn classify_frame(&mut self, frame: &HandFrame, now: Duration) -> FrameGestures {
        let left = frame.hand(Handedness::Left)
            .map_or(HandPose::None, |h| classify_hand(h, &self.config));

        let (right, swipe) = match frame.hand(Handedness::Right) {
            Some(h) => (classify_hand(h, &self.config), self.swipe.classify_swipe(h, now)),
            None    => {
                self.swipe.reset();
                (HandPose::None, SwipeEvent::None)
            }
        };

        if swipe != SwipeEvent::None {
            debug!(?swipe, at = ?now, "swipe");
        }
        FrameGestures { left, right, swipe }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> GestureConfig { GestureConfig::default() }

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    #[test]
    fn from_slice_rejects_wrong_count() {
        let pts = vec![Landmark::default(); 20];
        assert_eq!(HandLandmarks::from_slice(&pts), Err(LandmarkError::WrongCount(20)));
        let pts = vec![Landmark::default(); 21];
        assert!(HandLandmarks::from_slice(&pts).is_ok());
    }

    #[test]
    fn synthetic_poses_classify_back() {
        for pose in [
            HandPose::None, HandPose::OpenPalm, HandPose::Fist,
            HandPose::Pointing, HandPose::IndexNext, HandPose::IndexPrevious,
        ] {
            let hand = synth::hand(pose, 0.5, 0.7);
            assert_eq!(classify_hand(&hand, &cfg()), pose, "pose {:?}", pose);
        }
    }

    #[test]
    fn extension_is_strictly_greater() {
        // Tip exactly as far from the wrist as the PIP joint → not extended.
        let mut pts = *synth::hand(HandPose::Fist, 0.5, 0.7).points();
        pts[INDEX_TIP] = pts[INDEX_PIP];
        let hand = HandLandmarks::new(pts);
        assert!(!finger_extended(&hand, Finger::Index, &cfg()));
    }

    #[test]
    fn classification_is_pure() {
        let hand = synth::hand(HandPose::IndexNext, 0.4, 0.6);
        let a = classify_hand(&hand, &cfg());
        let b = classify_hand(&hand, &cfg());
        assert_eq!(a, b);

        let frames = [0.50, 0.62, 0.61, 0.40, 0.52];
        let run = || {
            let mut t = SwipeTracker::new(&cfg());
            frames.iter().enumerate()
                .map(|(i, &x)| t.classify_swipe(&synth::hand(HandPose::OpenPalm, x, 0.6), ms(i as u64 * 500)))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn first_observation_only_seeds() {
        let mut t = SwipeTracker::new(&cfg());
        let far = synth::hand(HandPose::OpenPalm, 0.9, 0.6);
        assert_eq!(t.classify_swipe(&far, ms(0)), SwipeEvent::None);
    }

    #[test]
    fn swipe_direction_follows_sign() {
        let mut t = SwipeTracker::new(&cfg());
        t.classify_swipe(&synth::hand(HandPose::OpenPalm, 0.5, 0.6), ms(0));
        assert_eq!(
            t.classify_swipe(&synth::hand(HandPose::OpenPalm, 0.7, 0.6), ms(10)),
            SwipeEvent::SwingRight,
        );
        assert_eq!(
            t.classify_swipe(&synth::hand(HandPose::OpenPalm, 0.4, 0.6), ms(2000)),
            SwipeEvent::SwingLeft,
        );
    }

    #[test]
    fn small_moves_never_swipe() {
        let mut t = SwipeTracker::new(&cfg());
        // Slow drift of 0.05 per call covers 0.5 overall but never swipes.
        for i in 0..10 {
            let x = 0.2 + 0.05 * i as f32;
            let e = t.classify_swipe(&synth::hand(HandPose::OpenPalm, x, 0.6), ms(i * 1000));
            assert_eq!(e, SwipeEvent::None);
        }
    }

    #[test]
    fn cooldown_separates_swipes() {
        let config = cfg();
        let mut t = SwipeTracker::new(&config);
        let mut last_emit: Option<Duration> = None;
        // Zig-zag at 100 ms intervals: every step is a big move.
        for i in 0..60u64 {
            let x = if i % 2 == 0 { 0.3 } else { 0.7 };
            let now = ms(i * 100);
            let e = t.classify_swipe(&synth::hand(HandPose::OpenPalm, x, 0.6), now);
            if e != SwipeEvent::None {
                if let Some(prev) = last_emit {
                    assert!(now - prev >= config.swipe_cooldown);
                }
                last_emit = Some(now);
            }
        }
        assert!(last_emit.is_some());
    }

    #[test]
    fn tracked_x_updates_during_cooldown() {
        let mut t = SwipeTracker::new(&cfg());
        t.classify_swipe(&synth::hand(HandPose::OpenPalm, 0.2, 0.6), ms(0));
        assert_eq!(t.classify_swipe(&synth::hand(HandPose::OpenPalm, 0.4, 0.6), ms(100)), SwipeEvent::SwingRight);
        // Blocked by cooldown, but the position is still recorded.
        assert_eq!(t.classify_swipe(&synth::hand(HandPose::OpenPalm, 0.6, 0.6), ms(200)), SwipeEvent::None);
        // Cooldown over; the tiny move from 0.6 is not a swipe.
        assert_eq!(t.classify_swipe(&synth::hand(HandPose::OpenPalm, 0.62, 0.6), ms(5000)), SwipeEvent::None);
    }

    #[test]
    fn missing_hands_classify_none() {
        let mut c = GestureClassifier::new(cfg());
        let g = c.classify_frame(&HandFrame::default(), ms(0));
        assert_eq!(g, FrameGestures::default());
    }

    #[test]
    fn losing_right_hand_resets_tracker() {
        let mut c = GestureClassifier::new(cfg());
        let at = |x| HandFrame::default().with_hand(Handedness::Right, synth::hand(HandPose::OpenPalm, x, 0.6));
        c.classify_frame(&at(0.2), ms(0));
        c.classify_frame(&HandFrame::default(), ms(100));
        // Re-entering far away is a fresh observation, not a swipe.
        assert_eq!(c.classify_frame(&at(0.8), ms(200)).swipe, SwipeEvent::None);
    }

    #[test]
    fn cooldown_survives_losing_the_hand() {
        let mut c = GestureClassifier::new(cfg());
        let cooldown = c.config().swipe_cooldown;
        let at = |x| HandFrame::default().with_hand(Handedness::Right, synth::hand(HandPose::OpenPalm, x, 0.6));
        c.classify_frame(&at(0.2), ms(0));
        assert_eq!(c.classify_frame(&at(0.6), ms(20)).swipe, SwipeEvent::SwingRight);

        c.classify_frame(&HandFrame::default(), ms(60));
        // Back in view with big jumps, still inside the cooldown.
        assert_eq!(c.classify_frame(&at(0.2), ms(100)).swipe, SwipeEvent::None);
        assert_eq!(c.classify_frame(&at(0.8), ms(200)).swipe, SwipeEvent::None);
        assert!(ms(200) - ms(20) < cooldown);

        // Once the cooldown has passed the next jump counts again.
        assert_eq!(c.classify_frame(&at(0.3), ms(20) + cooldown).swipe, SwipeEvent::SwingLeft);
    }

    #[test]
    fn frame_routes_hands_by_label() {
        let mut c = GestureClassifier::new(cfg());
        let frame = HandFrame::default()
            .with_hand(Handedness::Left,  synth::hand(HandPose::Fist, 0.3, 0.6))
            .with_hand(Handedness::Right, synth::hand(HandPose::Pointing, 0.7, 0.6));
        let g = c.classify_frame(&frame, ms(0));
        assert_eq!(g.left, HandPose::Fist);
        assert_eq!(g.right, HandPose::Pointing);
    }
}
