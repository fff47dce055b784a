//! Top-level application state.
//!
//! `AppState` owns the loaded photo clouds, the gesture classifier, the
//! navigator, the autoplay scheduler, the particle field and the panel
//! parameters.  It consumes `HandFrame`s and panel commands, and drives the
//! visualizer each frame.

use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;

use hand_gesture::{FrameGestures, GestureClassifier, GestureConfig, HandFrame};
use particle_field::{FieldConfig, FieldParams, ParticleField, ShapeKind, TargetSource};
use photo_cloud::{PointCloud, SamplerConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::autoplay::Autoplay;
use crate::clock::{Clock, SystemClock};
use crate::navigation::{BrowseCause, Mode, NavEvent, NavigationConfig, Navigator, SessionState, Target};
use crate::source::spawn_landmark_source;
use crate::visualizer::{Hud, Visualizer};

/// Select flash fades out over this many seconds.
const FLASH_SECONDS: f32 = 0.6;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub sampler:     SamplerConfig,
    pub gestures:    GestureConfig,
    pub navigation:  NavigationConfig,
    pub field:       FieldConfig,
    /// Initial parameter-panel values.
    pub params:      FieldParams,
    /// Image files and/or directories to load as photo clouds.
    pub photo_paths: Vec<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            sampler:     SamplerConfig::default(),
            gestures:    GestureConfig::default(),
            navigation:  NavigationConfig::default(),
            field:       FieldConfig::default(),
            params:      FieldParams::default(),
            photo_paths: vec![PathBuf::from("photos")],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Parameter panel
// ════════════════════════════════════════════════════════════════════════════

/// Edits to the parameter panel, from keyboard shortcuts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelCommand {
    Shape(ShapeKind),
    NextColor,
    Grow,
    Shrink,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── inputs ───────────────────────────────────────────────────────────
    clouds:     Vec<PointCloud>,
    classifier: GestureClassifier,
    gestures:   FrameGestures,

    // ── navigation ───────────────────────────────────────────────────────
    navigator:  Navigator,
    autoplay:   Autoplay,

    // ── particles ────────────────────────────────────────────────────────
    field:      ParticleField,
    params:     FieldParams,
    /// The field's target no longer matches the navigator's.
    dirty:      bool,

    // ── overlay ──────────────────────────────────────────────────────────
    flash:      f32,
    pub status: String,
}

impl AppState {
    pub fn new(cfg: AppConfig, clouds: Vec<PointCloud>) -> Self {
        let status = match clouds.len() {
            0 => "Ready. No photos loaded; shapes only.".to_string(),
            n => format!("Ready. {} photo(s). Open left palm to browse.", n),
        };
        AppState {
            clouds,
            classifier: GestureClassifier::new(cfg.gestures),
            gestures:   FrameGestures::default(),
            autoplay:   Autoplay::new(cfg.navigation.idle_interval),
            navigator:  Navigator::new(cfg.navigation),
            field:      ParticleField::new(cfg.field),
            params:     cfg.params,
            dirty:      true,
            flash:      0.0,
            status,
        }
    }

    // ── process one landmark frame ───────────────────────────────────────

    pub fn handle_frame(&mut self, frame: &HandFrame, now: Duration) -> Vec<NavEvent> {
        self.gestures = self.classifier.classify_frame(frame, now);
        let events = self.navigator.step(&self.gestures, self.clouds.len(), now);
        for event in &events {
            self.apply_event(event);
        }
        events
    }

    fn apply_event(&mut self, event: &NavEvent) {
        if event.retargets() {
            self.dirty = true;
        }
        self.status = match *event {
            NavEvent::EnteredPhotoView { index } => format!("PHOTO VIEW  {}", self.photo_label(index)),
            NavEvent::EnteredShape               => format!("SHAPE  {}", self.params.shape.name()),
            NavEvent::Browsed { index, cause }   => {
                let how = match cause {
                    BrowseCause::Swipe    => "swipe",
                    BrowseCause::Pointer  => "point",
                    BrowseCause::Autoplay => "auto",
                };
                format!("{} -> {}", how, self.photo_label(index))
            }
            NavEvent::Locked                     => "LOCKED".to_string(),
            NavEvent::Selected { index }         => {
                self.flash = 1.0;
                match index {
                    Some(i) => format!("SELECTED  {}", self.photo_label(i)),
                    None    => format!("SELECTED  {}", self.params.shape.name()),
                }
            }
            NavEvent::Unlocked                   => "unlocked".to_string(),
        };
    }

    fn photo_label(&self, index: usize) -> &str {
        self.clouds.get(index).map_or("?", |c| c.label())
    }

    // ── parameter panel ──────────────────────────────────────────────────

    pub fn apply_panel(&mut self, cmd: PanelCommand) {
        match cmd {
            PanelCommand::Shape(kind) => self.params.shape = kind,
            PanelCommand::NextColor   => self.params.next_color(),
            PanelCommand::Grow        => self.params.grow(),
            PanelCommand::Shrink      => self.params.shrink(),
        }
        // Size is read by the renderer; shape and color feed the target.
        let retarget = matches!(cmd, PanelCommand::Shape(_) | PanelCommand::NextColor);
        if retarget && self.navigator.state().mode == Mode::Shape {
            self.dirty = true;
        }
        debug!(?cmd, "panel");
    }

    // ── per-frame tick ───────────────────────────────────────────────────

    /// Autoplay, retarget if needed, then advance the morph by `dt` seconds.
    pub fn tick(&mut self, now: Duration, dt: f32) {
        let count = self.clouds.len();
        if let Some(event) = self.autoplay.poll(self.navigator.state_mut(), count, now) {
            self.apply_event(&event);
        }

        if self.dirty {
            self.rebuild_target();
            self.dirty = false;
        }

        self.field.tick(dt);
        self.flash = (self.flash - dt / FLASH_SECONDS).max(0.0);
    }

    fn rebuild_target(&mut self) {
        let source = match self.navigator.target() {
            Target::Photo(i) => self.clouds.get(i).map_or(TargetSource::Shape, TargetSource::Cloud),
            Target::Shape    => TargetSource::Shape,
        };
        self.field.set_target(source, &self.params);
    }

    // ── accessors for the render loop ────────────────────────────────────

    pub fn field(&self)    -> &ParticleField { &self.field }
    pub fn params(&self)   -> &FieldParams   { &self.params }
    pub fn session(&self)  -> &SessionState  { self.navigator.state() }
    pub fn gestures(&self) -> FrameGestures  { self.gestures }
    pub fn clouds(&self)   -> &[PointCloud]  { &self.clouds }
    pub fn flash(&self)    -> f32            { self.flash }

    pub fn hud(&self) -> Hud<'_> {
        let s = self.session();
        let photo = match s.target() {
            Target::Photo(i) => Some((i, self.clouds.len(), self.photo_label(i))),
            Target::Shape    => None,
        };
        Hud {
            mode:     s.mode,
            photo,
            left:     self.gestures.left,
            right:    self.gestures.right,
            locked:   s.lock_engaged,
            autoplay: s.autoplay_enabled,
            flash:    self.flash,
            status:   &self.status,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Loads the photo clouds, creates the visualizer and the landmark source
/// (keyboard simulation by default, hardware with `--features leap`), and
/// drives the frame/render loop at ~60 fps.
pub fn run(mut cfg: AppConfig) -> Result<(), String> {
    // ── Photos ────────────────────────────────────────────────────────────
    cfg.sampler.capacity = cfg.field.capacity;
    let paths = photo_cloud::expand_photo_paths(&cfg.photo_paths);
    let mut rng = StdRng::from_entropy();
    let clouds = photo_cloud::load_photo_clouds(&paths, &cfg.sampler, &mut rng);
    if clouds.is_empty() {
        warn!("no photo clouds loaded; open palm will have no effect");
    }

    // ── Landmark source ───────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel();
    #[cfg(feature = "leap")]
    let frames = {
        drop(sim_rx);
        spawn_landmark_source(crate::source::LeapLandmarkSource)
    };
    #[cfg(not(feature = "leap"))]
    let frames = spawn_landmark_source(crate::source::SimLandmarkSource::new(sim_rx));

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx)?;

    let mut app = AppState::new(cfg, clouds);
    let clock = SystemClock::new();
    let mut last = clock.now();
    let mut source_alive = true;
    let mut panel = Vec::new();
    info!("render loop started");

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Keyboard → sim input + panel commands
        if !vis.poll_input(&mut panel) { break; }
        for cmd in panel.drain(..) {
            app.apply_panel(cmd);
        }

        // 2. Drain landmark frames
        let now = clock.now();
        while source_alive {
            match frames.try_recv() {
                Ok(frame) => { app.handle_frame(&frame, now); }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("landmark source stopped; gestures disabled");
                    app.status = "hand tracking unavailable".to_string();
                    source_alive = false;
                }
            }
        }

        // 3. Per-frame logic
        let dt = now.saturating_sub(last).as_secs_f32();
        last = now;
        app.tick(now, dt);

        // 4. Render
        vis.render(app.field(), app.params(), &app.hud(), now.as_secs_f32());
    }

    info!("window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use hand_gesture::{synth, HandPose, Handedness};
    use photo_cloud::PointSample;

    const FRAME: Duration = Duration::from_millis(33);

    fn cloud(label: &str, n: usize, r: f32) -> PointCloud {
        let samples = (0..n)
            .map(|i| PointSample { x: i as f32 * 0.01, y: 0.25, r, g: 0.5, b: 0.5 })
            .collect();
        PointCloud::new(label, 1.0, samples)
    }

    fn make_app(photos: usize) -> AppState {
        let cfg = AppConfig {
            field: FieldConfig { capacity: 64, ..FieldConfig::default() },
            ..AppConfig::default()
        };
        let clouds = (0..photos).map(|i| cloud(&format!("p{}.png", i), 32, i as f32 * 0.1)).collect();
        AppState::new(cfg, clouds)
    }

    fn frame(left: Option<HandPose>, right: Option<HandPose>) -> HandFrame {
        let mut f = HandFrame::default();
        if let Some(p) = left  { f = f.with_hand(Handedness::Left,  synth::hand(p, 0.3, 0.7)); }
        if let Some(p) = right { f = f.with_hand(Handedness::Right, synth::hand(p, 0.7, 0.7)); }
        f
    }

    #[test]
    fn first_tick_builds_shape_target() {
        let mut app = make_app(0);
        assert!(app.field().target_positions().iter().all(|&v| v == 0.0));
        app.tick(Duration::ZERO, 0.0);
        assert!(app.field().target_positions().iter().any(|&v| v != 0.0));
        let c = &app.field().target_colors()[..3];
        assert_eq!(c, &app.params().color[..]);
    }

    #[test]
    fn open_palm_morphs_to_first_photo() {
        let mut app = make_app(2);
        app.tick(Duration::ZERO, 0.0);
        let ev = app.handle_frame(&frame(Some(HandPose::OpenPalm), None), FRAME);
        assert_eq!(ev, vec![NavEvent::EnteredPhotoView { index: 0 }]);
        app.tick(FRAME, 0.0);

        let scale = app.field().config().photo_scale;
        assert_eq!(&app.field().target_positions()[..3], &[0.0, 0.25 * scale, 0.0]);
        // Slots past the 32 samples are zero.
        assert!(app.field().target_positions()[32 * 3..].iter().all(|&v| v == 0.0));
        assert!(app.status.contains("p0.png"));
    }

    #[test]
    fn open_palm_without_photos_stays_on_shape() {
        let mut app = make_app(0);
        app.handle_frame(&frame(Some(HandPose::OpenPalm), None), FRAME);
        assert_eq!(app.session().mode, Mode::Shape);
    }

    #[test]
    fn sim_swipe_browses_and_wraps() {
        let mut app = make_app(3);
        let clock = ManualClock::new();
        app.handle_frame(&frame(Some(HandPose::OpenPalm), Some(HandPose::OpenPalm)), clock.now());
        app.navigator.state_mut().active_photo = Some(2);

        clock.advance(FRAME);
        let mut swiped = HandFrame::default()
            .with_hand(Handedness::Right, synth::hand(HandPose::OpenPalm, 0.9, 0.7));
        let ev = app.handle_frame(&swiped, clock.now());
        assert!(ev.contains(&NavEvent::Browsed { index: 0, cause: BrowseCause::Swipe }));

        // Wrist snaps back inside the cooldown: no second browse.
        clock.advance(FRAME);
        swiped = frame(None, Some(HandPose::OpenPalm));
        app.handle_frame(&swiped, clock.now());
        assert_eq!(app.session().active_photo, Some(0));
    }

    #[test]
    fn held_pointing_selects_once_and_flashes() {
        let mut app = make_app(2);
        let clock = ManualClock::new();
        app.handle_frame(&frame(Some(HandPose::OpenPalm), None), clock.now());

        let mut selects = 0;
        for _ in 0..90 {
            clock.advance(FRAME);
            let ev = app.handle_frame(&frame(None, Some(HandPose::Pointing)), clock.now());
            selects += ev.iter().filter(|e| matches!(e, NavEvent::Selected { .. })).count();
        }
        assert_eq!(selects, 1);
        assert!(!app.session().autoplay_enabled);
        assert!(app.flash() > 0.0);
    }

    #[test]
    fn autoplay_advances_through_tick() {
        let mut app = make_app(2);
        let clock = ManualClock::new();
        app.handle_frame(&frame(Some(HandPose::OpenPalm), None), clock.now());

        let mut advances = 0;
        for _ in 0..160 {
            clock.advance(Duration::from_millis(100));
            let before = app.session().active_photo;
            app.handle_frame(&frame(None, None), clock.now());
            app.tick(clock.now(), 0.1);
            if app.session().active_photo != before { advances += 1; }
        }
        assert_eq!(advances, 3);
    }

    #[test]
    fn panel_edits_retarget_only_in_shape_mode() {
        let mut app = make_app(1);
        app.tick(Duration::ZERO, 0.0);
        app.apply_panel(PanelCommand::NextColor);
        app.tick(Duration::ZERO, 0.0);
        assert_eq!(&app.field().target_colors()[..3], &app.params().color[..]);

        app.handle_frame(&frame(Some(HandPose::OpenPalm), None), FRAME);
        app.tick(FRAME, 0.0);
        let photo_target = app.field().target_positions().to_vec();
        app.apply_panel(PanelCommand::Shape(ShapeKind::Torus));
        app.tick(FRAME, 0.0);
        assert_eq!(app.field().target_positions(), photo_target.as_slice());
        assert_eq!(app.params().shape, ShapeKind::Torus);
    }

    #[test]
    fn fist_returns_to_shape_target() {
        let mut app = make_app(1);
        app.handle_frame(&frame(Some(HandPose::OpenPalm), None), FRAME);
        app.tick(FRAME, 0.0);
        app.handle_frame(&frame(Some(HandPose::Fist), None), FRAME * 2);
        app.tick(FRAME * 2, 0.0);
        assert_eq!(app.session().mode, Mode::Shape);
        assert!(app.hud().photo.is_none());
        assert_eq!(&app.field().target_colors()[..3], &app.params().color[..]);
    }

    #[test]
    fn size_changes_never_touch_the_target() {
        let mut app = make_app(0);
        app.tick(Duration::ZERO, 0.0);
        let before = app.field().target_positions().to_vec();
        app.apply_panel(PanelCommand::Grow);
        app.tick(Duration::ZERO, 0.0);
        assert_eq!(app.field().target_positions(), before.as_slice());
        assert_eq!(app.params().particle_size, FieldParams::default().particle_size + 0.5);
    }
}
