//! Mode / navigation state machine.
//!
//! The [`Navigator`] owns the single [`SessionState`] and advances it once per
//! landmark frame from the classified [`FrameGestures`]:
//!
//! * the **left** hand switches mode (open palm → photo view, fist → shape),
//! * the **right** hand browses, locks, and selects.
//!
//! Left-hand transitions win: a frame that switches mode skips the right
//! hand entirely and clears any pointing hold in progress.

use std::time::Duration;

use hand_gesture::{FrameGestures, HandPose, SwipeEvent};
use tracing::{debug, info};

// ════════════════════════════════════════════════════════════════════════════
// Public types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// Morphing toward the procedural shape from the parameter panel.
    #[default]
    Shape,
    /// Browsing photo point clouds.
    PhotoView,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Mode::Shape     => "shape",
            Mode::PhotoView => "photo",
        }
    }
}

/// What the particle field should currently be morphing toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Shape,
    Photo(usize),
}

/// Why the active photo changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowseCause {
    Swipe,
    /// A leaning index finger (IndexNext / IndexPrevious).
    Pointer,
    Autoplay,
}

/// Commands emitted by the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavEvent {
    EnteredPhotoView { index: usize },
    EnteredShape,
    Browsed { index: usize, cause: BrowseCause },
    /// The current view is held; autoplay is suspended.
    Locked,
    /// A sustained point fired.  `index` is the photo on screen, if any.
    Selected { index: Option<usize> },
    Unlocked,
}

impl NavEvent {
    /// True when the particle field needs a new target.
    pub fn retargets(&self) -> bool {
        matches!(self,
            NavEvent::EnteredPhotoView { .. } | NavEvent::EnteredShape | NavEvent::Browsed { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavigationConfig {
    /// How long the right hand must keep pointing before it selects.
    pub hold_duration: Duration,
    /// Idle time after which autoplay moves to the next photo.
    pub idle_interval: Duration,
    /// A lean that reappears within this window of the last lean frame
    /// is the same lean and does not browse again.
    pub lean_rearm:    Duration,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            hold_duration: Duration::from_millis(1200),
            idle_interval: Duration::from_secs(5),
            lean_rearm:    Duration::from_millis(250),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionState
// ════════════════════════════════════════════════════════════════════════════

/// The one mutable session record.  Updated by the navigator and the
/// autoplay scheduler; read by the app when rebuilding targets.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub mode:                Mode,
    /// Always `Some(i < photo_count)` in photo view, `None` in shape mode.
    pub active_photo:        Option<usize>,
    pub autoplay_enabled:    bool,
    /// Last mode switch or browse, manual or automatic.
    pub last_switch:         Duration,
    pub pointing_hold_start: Option<Duration>,
    /// The current pointing hold has already produced its select.
    pub select_fired:        bool,
    pub lock_engaged:        bool,
    /// Last leaning pose seen and when.
    pub last_lean:           Option<(HandPose, Duration)>,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            mode:                Mode::Shape,
            active_photo:        None,
            autoplay_enabled:    false,
            last_switch:         Duration::ZERO,
            pointing_hold_start: None,
            select_fired:        false,
            lock_engaged:        false,
            last_lean:           None,
        }
    }
}

impl SessionState {
    pub fn target(&self) -> Target {
        match (self.mode, self.active_photo) {
            (Mode::PhotoView, Some(i)) => Target::Photo(i),
            _                          => Target::Shape,
        }
    }

    /// Move the active photo by `delta`, wrapping modulo `photo_count`, and
    /// restart the idle countdown.  Returns the new index.
    pub fn browse(&mut self, delta: isize, photo_count: usize, now: Duration) -> usize {
        let count = photo_count.max(1) as isize;
        let current = self.active_photo.unwrap_or(0) as isize;
        let index = (current + delta).rem_euclid(count) as usize;
        self.active_photo = Some(index);
        self.last_switch = now;
        index
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Navigator
// ════════════════════════════════════════════════════════════════════════════

pub struct Navigator {
    config: NavigationConfig,
    state:  SessionState,
}

impl Navigator {
    pub fn new(config: NavigationConfig) -> Self {
        Navigator { config, state: SessionState::default() }
    }

    pub fn config(&self) -> &NavigationConfig { &self.config }
    pub fn state(&self) -> &SessionState { &self.state }
    pub fn state_mut(&mut self) -> &mut SessionState { &mut self.state }
    pub fn target(&self) -> Target { self.state.target() }

    /// Advance the session by one classified frame.
    pub fn step(
        &mut self,
        gestures:    &FrameGestures,
        photo_count: usize,
        now:         Duration,
    ) -> Vec<NavEvent> {
        let mut events = Vec::new();
        let fresh_lean = self.note_lean(gestures.right, now);

        if self.step_left(gestures.left, photo_count, now, &mut events) {
            // Mode switches clear the hold and the lock, then end the frame.
            let s = &mut self.state;
            s.pointing_hold_start = None;
            s.select_fired = false;
            if s.lock_engaged {
                s.lock_engaged = false;
                events.push(NavEvent::Unlocked);
            }
            return events;
        }

        self.step_browse(gestures, fresh_lean, photo_count, now, &mut events);
        self.step_right(gestures.right, now, &mut events);

        events
    }

    /// Record a leaning right hand.  True only for a lean that is new: a
    /// different direction, or the first one after `lean_rearm` without it.
    fn note_lean(&mut self, right: HandPose, now: Duration) -> bool {
        if !matches!(right, HandPose::IndexNext | HandPose::IndexPrevious) {
            return false;
        }
        let rearm = self.config.lean_rearm;
        let s = &mut self.state;
        let repeat = matches!(s.last_lean,
            Some((pose, seen)) if pose == right && now.saturating_sub(seen) <= rearm);
        s.last_lean = Some((right, now));
        !repeat
    }

    /// Left hand: mode switches.  Returns true if the mode changed.
    fn step_left(
        &mut self,
        left:        HandPose,
        photo_count: usize,
        now:         Duration,
        events:      &mut Vec<NavEvent>,
    ) -> bool {
        let s = &mut self.state;
        match left {
            HandPose::OpenPalm if photo_count > 0 && s.mode != Mode::PhotoView => {
                let index = match s.active_photo {
                    Some(i) if i < photo_count => i,
                    _                          => 0,
                };
                s.mode = Mode::PhotoView;
                s.active_photo = Some(index);
                s.autoplay_enabled = true;
                s.last_switch = now;
                info!(index, "entered photo view");
                events.push(NavEvent::EnteredPhotoView { index });
                true
            }
            HandPose::Fist if s.mode != Mode::Shape => {
                s.mode = Mode::Shape;
                s.active_photo = None;
                s.last_switch = now;
                info!("entered shape mode");
                events.push(NavEvent::EnteredShape);
                true
            }
            _ => false,
        }
    }

    /// Swipes and leaning pointers browse while in photo view.
    fn step_browse(
        &mut self,
        gestures:    &FrameGestures,
        fresh_lean:  bool,
        photo_count: usize,
        now:         Duration,
        events:      &mut Vec<NavEvent>,
    ) {
        let s = &mut self.state;
        if s.mode != Mode::PhotoView || photo_count < 2 {
            return;
        }

        let swipe = match gestures.swipe {
            SwipeEvent::SwingLeft  => Some(-1),
            SwipeEvent::SwingRight => Some(1),
            SwipeEvent::None       => None,
        };
        if let Some(delta) = swipe {
            let index = s.browse(delta, photo_count, now);
            debug!(index, "swipe browse");
            events.push(NavEvent::Browsed { index, cause: BrowseCause::Swipe });
        }

        if fresh_lean {
            let lean = match gestures.right {
                HandPose::IndexNext     => Some(1),
                HandPose::IndexPrevious => Some(-1),
                _                       => None,
            };
            if let Some(delta) = lean {
                let index = s.browse(delta, photo_count, now);
                debug!(index, "pointer browse");
                events.push(NavEvent::Browsed { index, cause: BrowseCause::Pointer });
            }
        }
    }

    /// Right hand: lock, select, release.
    fn step_right(&mut self, right: HandPose, now: Duration, events: &mut Vec<NavEvent>) {
        match right {
            HandPose::Fist => {
                self.state.pointing_hold_start = None;
                self.state.select_fired = false;
                self.engage_lock(events);
            }
            HandPose::Pointing => {
                let start = *self.state.pointing_hold_start.get_or_insert(now);
                if self.state.select_fired {
                    // Still holding after the select: the view stays locked.
                } else if now.saturating_sub(start) > self.config.hold_duration {
                    self.state.select_fired = true;
                    let index = self.state.active_photo;
                    info!(?index, "select");
                    events.push(NavEvent::Selected { index });
                    self.engage_lock(events);
                } else {
                    self.release_lock(now, events);
                }
            }
            _ => {
                self.state.pointing_hold_start = None;
                self.state.select_fired = false;
                self.release_lock(now, events);
            }
        }
    }

    fn engage_lock(&mut self, events: &mut Vec<NavEvent>) {
        self.state.autoplay_enabled = false;
        if !self.state.lock_engaged {
            self.state.lock_engaged = true;
            debug!("view locked");
            events.push(NavEvent::Locked);
        }
    }

    /// Clear the lock and make autoplay eligible again.  Leaving a lock
    /// restarts the idle countdown so the view does not jump immediately.
    fn release_lock(&mut self, now: Duration, events: &mut Vec<NavEvent>) {
        self.state.autoplay_enabled = true;
        if self.state.lock_engaged {
            self.state.lock_engaged = false;
            self.state.last_switch = now;
            debug!("view unlocked");
            events.push(NavEvent::Unlocked);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    fn frame(left: HandPose, right: HandPose, swipe: SwipeEvent) -> FrameGestures {
        FrameGestures { left, right, swipe }
    }

    fn idle() -> FrameGestures { FrameGestures::default() }

    fn nav() -> Navigator { Navigator::new(NavigationConfig::default()) }

    /// Navigator already in photo view with `count` photos at `index`.
    fn viewing(count: usize, index: usize) -> Navigator {
        let mut n = nav();
        n.step(&frame(HandPose::OpenPalm, HandPose::None, SwipeEvent::None), count, ms(0));
        n.state_mut().active_photo = Some(index);
        n
    }

    #[test]
    fn starts_in_shape_mode() {
        let n = nav();
        assert_eq!(n.state().mode, Mode::Shape);
        assert_eq!(n.target(), Target::Shape);
    }

    #[test]
    fn open_palm_enters_photo_view_at_zero() {
        let mut n = nav();
        let ev = n.step(&frame(HandPose::OpenPalm, HandPose::None, SwipeEvent::None), 2, ms(40));
        assert_eq!(ev, vec![NavEvent::EnteredPhotoView { index: 0 }]);
        assert_eq!(n.state().mode, Mode::PhotoView);
        assert_eq!(n.state().active_photo, Some(0));
        assert!(n.state().autoplay_enabled);
        assert_eq!(n.state().last_switch, ms(40));
        assert_eq!(n.target(), Target::Photo(0));
    }

    #[test]
    fn open_palm_without_photos_does_nothing() {
        let mut n = nav();
        let ev = n.step(&frame(HandPose::OpenPalm, HandPose::None, SwipeEvent::None), 0, ms(0));
        assert!(ev.iter().all(|e| !e.retargets()));
        assert_eq!(n.state().mode, Mode::Shape);
    }

    #[test]
    fn held_open_palm_switches_once() {
        let mut n = nav();
        let palm = frame(HandPose::OpenPalm, HandPose::None, SwipeEvent::None);
        assert!(n.step(&palm, 3, ms(0)).iter().any(NavEvent::retargets));
        assert!(!n.step(&palm, 3, ms(16)).iter().any(NavEvent::retargets));
    }

    #[test]
    fn fist_returns_to_shape() {
        let mut n = viewing(3, 1);
        let ev = n.step(&frame(HandPose::Fist, HandPose::None, SwipeEvent::None), 3, ms(100));
        assert_eq!(ev, vec![NavEvent::EnteredShape]);
        assert_eq!(n.state().active_photo, None);
        assert_eq!(n.target(), Target::Shape);
    }

    #[test]
    fn swipe_right_wraps_to_zero() {
        let mut n = viewing(3, 2);
        let ev = n.step(&frame(HandPose::None, HandPose::OpenPalm, SwipeEvent::SwingRight), 3, ms(500));
        assert!(ev.contains(&NavEvent::Browsed { index: 0, cause: BrowseCause::Swipe }));
        assert_eq!(n.state().active_photo, Some(0));
        assert_eq!(n.state().last_switch, ms(500));
    }

    #[test]
    fn swipe_left_wraps_to_last() {
        let mut n = viewing(3, 0);
        n.step(&frame(HandPose::None, HandPose::OpenPalm, SwipeEvent::SwingLeft), 3, ms(500));
        assert_eq!(n.state().active_photo, Some(2));
    }

    #[test]
    fn swipes_ignored_with_one_photo_or_in_shape_mode() {
        let mut one = viewing(1, 0);
        let ev = one.step(&frame(HandPose::None, HandPose::OpenPalm, SwipeEvent::SwingRight), 1, ms(10));
        assert!(ev.is_empty());
        assert_eq!(one.state().active_photo, Some(0));

        let mut shape = nav();
        let ev = shape.step(&frame(HandPose::None, HandPose::OpenPalm, SwipeEvent::SwingRight), 3, ms(10));
        assert!(ev.is_empty());
        assert_eq!(shape.state().active_photo, None);
    }

    #[test]
    fn leaning_pointer_browses_once_per_lean() {
        let mut n = viewing(4, 1);
        let lean = frame(HandPose::None, HandPose::IndexNext, SwipeEvent::None);
        let ev = n.step(&lean, 4, ms(10));
        assert!(ev.contains(&NavEvent::Browsed { index: 2, cause: BrowseCause::Pointer }));
        // Holding the same lean does not repeat.
        assert!(n.step(&lean, 4, ms(30)).iter().all(|e| !e.retargets()));
        n.step(&idle(), 4, ms(50));
        n.step(&frame(HandPose::None, HandPose::IndexPrevious, SwipeEvent::None), 4, ms(70));
        assert_eq!(n.state().active_photo, Some(1));
    }

    #[test]
    fn lean_survives_a_dropped_frame() {
        let mut n = viewing(4, 0);
        let rearm = n.config().lean_rearm;
        let lean = frame(HandPose::None, HandPose::IndexNext, SwipeEvent::None);
        n.step(&lean, 4, ms(100));
        // One noisy frame inside a held lean.
        n.step(&idle(), 4, ms(116));
        let ev = n.step(&lean, 4, ms(132));
        assert!(ev.iter().all(|e| !e.retargets()));
        assert_eq!(n.state().active_photo, Some(1));

        // A real release longer than the re-arm window counts again.
        n.step(&idle(), 4, ms(150));
        n.step(&lean, 4, ms(132) + rearm + ms(1));
        assert_eq!(n.state().active_photo, Some(2));
    }

    #[test]
    fn right_fist_locks_and_disables_autoplay() {
        let mut n = viewing(2, 0);
        let ev = n.step(&frame(HandPose::None, HandPose::Fist, SwipeEvent::None), 2, ms(10));
        assert_eq!(ev, vec![NavEvent::Locked]);
        assert!(n.state().lock_engaged);
        assert!(!n.state().autoplay_enabled);
        // Holding the fist does not re-emit.
        assert!(n.step(&frame(HandPose::None, HandPose::Fist, SwipeEvent::None), 2, ms(20)).is_empty());
    }

    #[test]
    fn other_pose_releases_lock() {
        let mut n = viewing(2, 0);
        n.step(&frame(HandPose::None, HandPose::Fist, SwipeEvent::None), 2, ms(10));
        let ev = n.step(&frame(HandPose::None, HandPose::OpenPalm, SwipeEvent::None), 2, ms(900));
        assert_eq!(ev, vec![NavEvent::Unlocked]);
        assert!(!n.state().lock_engaged);
        assert!(n.state().autoplay_enabled);
        assert_eq!(n.state().last_switch, ms(900));
    }

    #[test]
    fn sustained_pointing_selects_exactly_once() {
        let mut n = viewing(2, 1);
        let point = frame(HandPose::None, HandPose::Pointing, SwipeEvent::None);
        let hold = n.config().hold_duration;
        let mut selects = 0;
        let mut t = ms(0);
        while t <= hold * 3 {
            for e in n.step(&point, 2, t) {
                if let NavEvent::Selected { index } = e {
                    assert_eq!(index, Some(1));
                    selects += 1;
                }
            }
            t += ms(16);
        }
        assert_eq!(selects, 1);
        assert!(!n.state().autoplay_enabled);
        assert!(n.state().lock_engaged);
    }

    #[test]
    fn interrupted_pointing_restarts_hold() {
        let mut n = viewing(2, 0);
        let point = frame(HandPose::None, HandPose::Pointing, SwipeEvent::None);
        let hold = n.config().hold_duration;
        n.step(&point, 2, ms(0));
        n.step(&point, 2, hold - ms(100));
        n.step(&idle(), 2, hold - ms(50));
        assert_eq!(n.state().pointing_hold_start, None);
        // Resumed pointing needs a full hold again.
        let ev = n.step(&point, 2, hold + ms(50));
        assert!(!ev.iter().any(|e| matches!(e, NavEvent::Selected { .. })));
    }

    #[test]
    fn mode_switch_clears_hold_and_skips_right_hand() {
        let mut n = nav();
        let point = frame(HandPose::None, HandPose::Pointing, SwipeEvent::None);
        n.step(&point, 2, ms(0));
        assert!(n.state().pointing_hold_start.is_some());

        // Left palm + right fist: the mode switch wins, no lock this frame.
        let ev = n.step(&frame(HandPose::OpenPalm, HandPose::Fist, SwipeEvent::SwingRight), 2, ms(100));
        assert_eq!(ev, vec![NavEvent::EnteredPhotoView { index: 0 }]);
        assert_eq!(n.state().pointing_hold_start, None);
        assert!(!n.state().lock_engaged);
        assert_eq!(n.state().active_photo, Some(0));
    }

    #[test]
    fn mode_switch_releases_an_engaged_lock() {
        let mut n = viewing(2, 1);
        let ev = n.step(&frame(HandPose::None, HandPose::Fist, SwipeEvent::None), 2, ms(10));
        assert_eq!(ev, vec![NavEvent::Locked]);
        n.step(&frame(HandPose::None, HandPose::Fist, SwipeEvent::None), 2, ms(30));

        let ev = n.step(&frame(HandPose::Fist, HandPose::Fist, SwipeEvent::None), 2, ms(50));
        assert_eq!(ev, vec![NavEvent::EnteredShape, NavEvent::Unlocked]);
        assert!(!n.state().lock_engaged);
        assert_eq!(n.state().pointing_hold_start, None);
        assert_eq!(n.target(), Target::Shape);

        // Locked in shape mode, then an open palm switches back.
        n.step(&frame(HandPose::None, HandPose::Fist, SwipeEvent::None), 2, ms(70));
        assert!(n.state().lock_engaged);
        let ev = n.step(&frame(HandPose::OpenPalm, HandPose::Fist, SwipeEvent::None), 2, ms(90));
        assert_eq!(ev, vec![NavEvent::EnteredPhotoView { index: 0 }, NavEvent::Unlocked]);
        assert!(!n.state().lock_engaged);
        assert_eq!(n.state().pointing_hold_start, None);
    }

    #[test]
    fn browse_wraps_both_directions() {
        let mut s = SessionState { active_photo: Some(0), ..SessionState::default() };
        assert_eq!(s.browse(-1, 5, ms(1)), 4);
        assert_eq!(s.browse(3, 5, ms(2)), 2);
        assert_eq!(s.browse(13, 5, ms(3)), 0);
    }
}
