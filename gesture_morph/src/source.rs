//! Hand-landmark sources: LeapMotion hardware and keyboard simulation.
//!
//! The public interface is a stream of [`HandFrame`]s delivered over an
//! `mpsc` channel.  The render loop never knows whether a frame came from a
//! tracker or from the simulator; both produce the same 21-point skeletons
//! and go through the same classifier.

use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use hand_gesture::{synth, HandFrame, HandPose, Handedness};
use tracing::{debug, info, warn};

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`HandFrame`]s over a channel.
///
/// `run` owns its thread until the receiver hangs up or the device fails.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandFrame>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<HandFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// LeapC reports bones in millimetres above the device.  Each digit's joints
/// are mapped onto the MediaPipe layout (base → tip) and projected into the
/// normalised image plane the classifier expects, with `y` growing downward:
///
/// | Axis | Mapping |
/// |---|---|
/// | x | `(x + 200) / 400` |
/// | y | `1 − (y − 50) / 400` |
/// | z | `z / 400` |
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource;

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        use leaprs::*;
        use tracing::error;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                error!(error = ?e, "could not create LeapC connection");
                return;
            }
        };
        if let Err(e) = connection.open() {
            error!(error = ?e, "could not open LeapMotion device");
            return;
        }
        info!("LeapMotion connected");

        let mut health = PollHealth::default();
        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(e) => {
                    if !health.failed(&e, &tx) { return; }
                    continue;
                }
            };
            health.recovered();

            if let Event::Tracking(tracking) = msg.event() {
                let mut frame = HandFrame::default();
                for hand in tracking.hands() {
                    let handedness = if hand.hand_type() == HandType::Left {
                        Handedness::Left
                    } else {
                        Handedness::Right
                    };
                    if let Some(landmarks) = leap_landmarks(&hand) {
                        frame = frame.with_hand(handedness, landmarks);
                    }
                }
                if tx.send(frame).is_err() { return; }
            }
        }
    }
}

/// Poll-failure bookkeeping for a device loop.
///
/// The first failure of a run is logged and every failed poll reports an
/// empty frame, so the app sees the hands as lost and a dropped receiver
/// still ends the loop while the device is down.
#[cfg_attr(not(feature = "leap"), allow(dead_code))]
#[derive(Debug, Default)]
struct PollHealth {
    failing: bool,
}

#[cfg_attr(not(feature = "leap"), allow(dead_code))]
impl PollHealth {
    /// Returns false once the receiver has hung up.
    fn failed(&mut self, error: &dyn fmt::Debug, tx: &Sender<HandFrame>) -> bool {
        if !self.failing {
            warn!(?error, "LeapMotion poll failed, reporting no hands");
            self.failing = true;
        }
        tx.send(HandFrame::default()).is_ok()
    }

    fn recovered(&mut self) {
        if self.failing {
            info!("LeapMotion polling recovered");
            self.failing = false;
        }
    }
}

/// Wrist, then base → tip for thumb, index, middle, ring, pinky.
#[cfg(feature = "leap")]
fn leap_landmarks(hand: &leaprs::Hand) -> Option<hand_gesture::HandLandmarks> {
    use hand_gesture::{HandLandmarks, Landmark};

    let to_image = |x: f32, y: f32, z: f32| Landmark::new(
        (x + 200.0) / 400.0,
        1.0 - (y - 50.0) / 400.0,
        z / 400.0,
    );

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 { return None; }

    let mut points = Vec::with_capacity(hand_gesture::LANDMARK_COUNT);
    let w = digits[2].metacarpal().prev_joint();
    points.push(to_image(w.x, w.y, w.z));
    for digit in &digits {
        let a = digit.proximal().prev_joint();
        let b = digit.intermediate().prev_joint();
        let c = digit.distal().prev_joint();
        let d = digit.distal().next_joint();
        points.push(to_image(a.x, a.y, a.z));
        points.push(to_image(b.x, b.y, b.z));
        points.push(to_image(c.x, c.y, c.z));
        points.push(to_image(d.x, d.y, d.z));
    }
    HandLandmarks::from_slice(&points).ok()
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource: keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown(SimKey),
    KeyUp(SimKey),
}

/// Simulated hand controls (mapped from minifb keys by the visualizer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimKey {
    LeftOpen,       // O
    LeftFist,       // F
    RightFist,      // G
    RightPoint,     // P
    RightNext,      // N
    RightPrevious,  // B
    SwipeLeft,      // ←
    SwipeRight,     // →
}

impl SimKey {
    fn left_pose(self) -> Option<HandPose> {
        match self {
            SimKey::LeftOpen => Some(HandPose::OpenPalm),
            SimKey::LeftFist => Some(HandPose::Fist),
            _                => None,
        }
    }

    fn right_pose(self) -> Option<HandPose> {
        match self {
            SimKey::RightFist     => Some(HandPose::Fist),
            SimKey::RightPoint    => Some(HandPose::Pointing),
            SimKey::RightNext     => Some(HandPose::IndexNext),
            SimKey::RightPrevious => Some(HandPose::IndexPrevious),
            _                     => None,
        }
    }
}

/// Resting wrist positions of the simulated hands.
const LEFT_WRIST:  (f32, f32) = (0.3, 0.7);
const RIGHT_WRIST: (f32, f32) = (0.7, 0.7);
/// Wrist jump of a simulated swipe, well past the default threshold.
const SWIPE_JUMP: f32 = 0.2;

/// Which simulated keys are down, and the synthetic frame they describe.
///
/// The right hand is always in view, resting as an open palm; the left hand
/// only appears while `O` or `F` is held.  The most recently pressed key wins
/// when several poses for one hand are held.  A swipe displaces the right
/// wrist for exactly one frame.
#[derive(Clone, Debug, Default)]
pub struct SimHands {
    held:  Vec<SimKey>,
    swipe: Option<f32>,
}

impl SimHands {
    pub fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::KeyDown(SimKey::SwipeLeft)  => self.swipe = Some(-SWIPE_JUMP),
            SimInput::KeyDown(SimKey::SwipeRight) => self.swipe = Some(SWIPE_JUMP),
            SimInput::KeyDown(key) => {
                self.held.retain(|&k| k != key);
                self.held.push(key);
            }
            SimInput::KeyUp(key) => self.held.retain(|&k| k != key),
        }
    }

    fn latest(&self, pose_of: fn(SimKey) -> Option<HandPose>) -> Option<HandPose> {
        self.held.iter().rev().find_map(|&k| pose_of(k))
    }

    /// Build the next frame, consuming any pending swipe.
    pub fn frame(&mut self) -> HandFrame {
        let mut frame = HandFrame::default();

        if let Some(pose) = self.latest(SimKey::left_pose) {
            let (x, y) = LEFT_WRIST;
            frame = frame.with_hand(Handedness::Left, synth::hand(pose, x, y));
        }

        let pose = self.latest(SimKey::right_pose).unwrap_or(HandPose::OpenPalm);
        let (x, y) = RIGHT_WRIST;
        let x = x + self.swipe.take().unwrap_or(0.0);
        frame.with_hand(Handedness::Right, synth::hand(pose, x, y))
    }
}

/// Landmark source driven by [`SimInput`] events from the visualizer's
/// window.  Emits one synthetic frame per `frame_interval`, like a camera.
pub struct SimLandmarkSource {
    pub rx:             Receiver<SimInput>,
    pub frame_interval: Duration,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimLandmarkSource { rx, frame_interval: Duration::from_millis(33) }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        info!("keyboard hand simulator running");
        let mut hands = SimHands::default();
        let mut next_frame = Instant::now() + self.frame_interval;

        loop {
            let wait = next_frame.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(wait) {
                Ok(input) => {
                    debug!(?input, "sim input");
                    hands.apply(input);
                }
                Err(RecvTimeoutError::Timeout) => {
                    next_frame += self.frame_interval;
                    if tx.send(hands.frame()).is_err() { return; }
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
