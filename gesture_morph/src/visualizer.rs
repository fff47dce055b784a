//! Software-rendered particle view using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ MODE / PHOTO  n/N  label                         L:pose  R:pose  │
//! │ SHAPE  COLOR  SIZE                                   AUTO  LOCK  │
//! │                                                                  │
//! │                      · ·  particle field  · ·                    │
//! │                    (perspective, slow orbit)                     │
//! │                                                                  │
//! │ status                                                           │
//! │ key legend                                                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A gold border marks an engaged lock; a select flashes the border white.

use std::sync::mpsc::Sender;

use hand_gesture::HandPose;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use particle_field::{FieldParams, ParticleField};

use crate::app::PanelCommand;
use crate::navigation::Mode;
use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:    usize = 960;
pub const WIN_H:    usize = 640;
const HUD_H:        usize = 34;
const STATUS_Y:     usize = WIN_H - 30;
const BG_COLOR:     u32   = 0xFF07070F;
const HUD_BG:       u32   = 0xFF10142A;
const LOCK_COLOR:   u32   = 0xFFFFD700;  // gold
const TEXT_COLOR:   u32   = 0xFFEEEEEE;
const DIM_TEXT:     u32   = 0xFF888888;
const LEGEND:       &str  =
    "O/F=left palm/fist  G/P=right fist/point  N/B=lean  </>=swipe  1-4=shape  C=color  +/-=size  Q=quit";

/// Camera distance from the origin, world units.
const CAMERA_DIST:  f32   = 6.0;
/// Pixels per world unit at the origin's depth is `FOCAL / CAMERA_DIST`.
const FOCAL:        f32   = 640.0;
/// Peak yaw of the orbit, radians, and its angular rate.
const ORBIT_SWAY:   f32   = 0.45;
const ORBIT_RATE:   f32   = 0.25;
/// Particles dimmer than this (summed channels) are unused slots.
const BLACK_CUTOFF: f32   = 0.03;

// ════════════════════════════════════════════════════════════════════════════
// HUD snapshot
// ════════════════════════════════════════════════════════════════════════════

/// Everything the overlay shows, snapshotted from `AppState` each frame.
pub struct Hud<'a> {
    pub mode:     Mode,
    /// `(index, count, label)` of the photo on screen.
    pub photo:    Option<(usize, usize, &'a str)>,
    pub left:     HandPose,
    pub right:    HandPose,
    pub locked:   bool,
    pub autoplay: bool,
    /// Select flash intensity, 1.0 right after a select, decaying to 0.
    pub flash:    f32,
    pub status:   &'a str,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    sim_tx: Sender<SimInput>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, String> {
        let mut window = Window::new(
            "Gesture Morph",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Translate keyboard state: hand keys go to the simulator as
    /// [`SimInput`]s, panel keys are collected into `panel`.
    ///
    /// Returns false when the user asked to quit.
    pub fn poll_input(&mut self, panel: &mut Vec<PanelCommand>) -> bool {
        if !self.window.is_open() { return false; }

        for key in self.window.get_keys_pressed(KeyRepeat::No) {
            if matches!(key, Key::Q | Key::Escape) {
                return false;
            }
            if let Some(sim) = sim_key(key) {
                let _ = self.sim_tx.send(SimInput::KeyDown(sim));
            } else if let Some(cmd) = panel_command(key) {
                panel.push(cmd);
            }
        }
        for key in self.window.get_keys_released() {
            if let Some(sim) = sim_key(key) {
                let _ = self.sim_tx.send(SimInput::KeyUp(sim));
            }
        }

        true
    }

    /// Render one frame.  `t` is seconds since start and drives the orbit.
    pub fn render(&mut self, field: &ParticleField, params: &FieldParams, hud: &Hud<'_>, t: f32) {
        self.buf.fill(BG_COLOR);

        // ── Particles ─────────────────────────────────────────────────────
        let yaw  = ORBIT_SWAY * (t * ORBIT_RATE).sin();
        let size = params.particle_size.round().max(1.0) as usize;
        let positions = field.positions().chunks_exact(3);
        let colors    = field.colors().chunks_exact(3);
        for (p, c) in positions.zip(colors) {
            if c[0] + c[1] + c[2] < BLACK_CUTOFF { continue; }
            if let Some((sx, sy)) = project([p[0], p[1], p[2]], yaw) {
                let half = size / 2;
                self.fill_rect(sx.saturating_sub(half), sy.saturating_sub(half), size, size, to_argb(c));
            }
        }

        // ── HUD ───────────────────────────────────────────────────────────
        self.fill_rect(0, 0, WIN_W, HUD_H, HUD_BG);
        let headline = match (hud.mode, hud.photo) {
            (Mode::PhotoView, Some((i, n, label))) => format!("PHOTO {}/{}  {}", i + 1, n, label),
            _                                      => format!("SHAPE  {}", params.shape.name()),
        };
        self.draw_text(&headline, 10, 5, 2, TEXT_COLOR);
        self.draw_text(
            &format!("COLOR {:06X}  SIZE {:.1}", to_argb(&params.color) & 0xFFFFFF, params.particle_size),
            10, 22, 1, DIM_TEXT,
        );

        let hands = format!("L:{}  R:{}", hud.left.name(), hud.right.name());
        self.draw_text(&hands, WIN_W - 10 - text_width(&hands, 1), 8, 1, TEXT_COLOR);
        let flags = format!(
            "{}  {}",
            if hud.autoplay { "AUTO" } else { "MANUAL" },
            if hud.locked   { "LOCK" } else { "FREE" },
        );
        let flag_color = if hud.locked { LOCK_COLOR } else { DIM_TEXT };
        self.draw_text(&flags, WIN_W - 10 - text_width(&flags, 1), 22, 1, flag_color);

        // ── Lock border / select flash ────────────────────────────────────
        if hud.flash > 0.0 {
            let c = blend(LOCK_COLOR, 0xFFFFFFFF, hud.flash);
            for inset in 0..4 {
                self.draw_border(inset, inset, WIN_W - 2 * inset, WIN_H - 2 * inset, c);
            }
        } else if hud.locked {
            self.draw_border(0, 0, WIN_W, WIN_H, LOCK_COLOR);
            self.draw_border(1, 1, WIN_W - 2, WIN_H - 2, LOCK_COLOR);
        }

        // ── Status + legend ───────────────────────────────────────────────
        self.draw_text(hud.status, 10, STATUS_Y, 1, TEXT_COLOR);
        self.draw_text(LEGEND, 10, WIN_H - 14, 1, DIM_TEXT);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        let x_end = (x + w).min(WIN_W);
        if x >= x_end { return; }
        for row in self.buf.chunks_exact_mut(WIN_W).skip(y).take(h) {
            row[x..x_end].fill(color);
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            self.plot(col, y, color);
            self.plot(col, y + h - 1, color);
        }
        for row in y..(y+h).min(WIN_H) {
            self.plot(x, row, color);
            self.plot(x + w - 1, row, color);
        }
    }

    fn plot(&mut self, x: usize, y: usize, color: u32) {
        if x >= WIN_W { return; }
        if let Some(px) = self.buf.get_mut(y * WIN_W + x) {
            *px = color;
        }
    }

    /// Draw `text` in the 3×5 font, each font pixel a `scale`×`scale` block.
    /// Clipped at the right edge.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        for (i, ch) in text.chars().enumerate() {
            let gx = x + i * GLYPH_ADVANCE * scale;
            if gx + GLYPH_ADVANCE * scale > WIN_W { break; }
            let bits = glyph(ch).unwrap_or(UNKNOWN_GLYPH);
            for bit in (0..15usize).filter(|&b| bits & (0x4000 >> b) != 0) {
                let (row, col) = (bit / 3, bit % 3);
                self.fill_rect(gx + col * scale, y + row * scale, scale, scale, color);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Key mapping
// ════════════════════════════════════════════════════════════════════════════

fn sim_key(key: Key) -> Option<SimKey> {
    Some(match key {
        Key::O     => SimKey::LeftOpen,
        Key::F     => SimKey::LeftFist,
        Key::G     => SimKey::RightFist,
        Key::P     => SimKey::RightPoint,
        Key::N     => SimKey::RightNext,
        Key::B     => SimKey::RightPrevious,
        Key::Left  => SimKey::SwipeLeft,
        Key::Right => SimKey::SwipeRight,
        _          => return None,
    })
}

fn panel_command(key: Key) -> Option<PanelCommand> {
    use particle_field::ShapeKind;
    Some(match key {
        Key::Key1 | Key::NumPad1           => PanelCommand::Shape(ShapeKind::Heart),
        Key::Key2 | Key::NumPad2           => PanelCommand::Shape(ShapeKind::Sphere),
        Key::Key3 | Key::NumPad3           => PanelCommand::Shape(ShapeKind::Torus),
        Key::Key4 | Key::NumPad4           => PanelCommand::Shape(ShapeKind::Spiral),
        Key::C                             => PanelCommand::NextColor,
        Key::Equal | Key::NumPadPlus       => PanelCommand::Grow,
        Key::Minus | Key::NumPadMinus      => PanelCommand::Shrink,
        _                                  => return None,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Projection & color
// ════════════════════════════════════════════════════════════════════════════

/// Rotate `p` about the vertical axis by `yaw`, then project it through a
/// pinhole camera on the +z axis looking at the origin.  `None` when the
/// point is behind the camera or off screen.
fn project(p: [f32; 3], yaw: f32) -> Option<(usize, usize)> {
    let (sin, cos) = yaw.sin_cos();
    let x = p[0] * cos + p[2] * sin;
    let z = -p[0] * sin + p[2] * cos;
    let depth = CAMERA_DIST - z;
    if depth < 0.1 { return None; }

    let sx = WIN_W as f32 / 2.0 + x    / depth * FOCAL;
    let sy = WIN_H as f32 / 2.0 - p[1] / depth * FOCAL;
    if sx < 0.0 || sy < 0.0 || sx >= WIN_W as f32 || sy >= WIN_H as f32 {
        return None;
    }
    Some((sx as usize, sy as usize))
}

/// `[0,1]` RGB → opaque ARGB.
fn to_argb(c: &[f32]) -> u32 {
    let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF000000 | (ch(c[0]) << 16) | (ch(c[1]) << 8) | ch(c[2])
}

fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * GLYPH_ADVANCE * scale
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

/// Glyph cell width plus a one-pixel gap.
const GLYPH_ADVANCE: usize = 4;

/// Glyphs packed row-major from the top, three bits per row, MSB on the left.
/// Covers what the HUD draws plus the usual file-name punctuation.
const GLYPHS: &[(char, u16)] = &[
    ('0', 0x7B6F), ('1', 0x2C97), ('2', 0x73E7), ('3', 0x73CF), ('4', 0x5BC9), ('5', 0x79CF),
    ('6', 0x79EF), ('7', 0x7249), ('8', 0x7BEF), ('9', 0x7BCF), ('A', 0x7BED), ('B', 0x6BAE),
    ('C', 0x7927), ('D', 0x6B6E), ('E', 0x79E7), ('F', 0x79E4), ('G', 0x796F), ('H', 0x5BED),
    ('I', 0x7497), ('J', 0x126F), ('K', 0x5BAD), ('L', 0x4927), ('M', 0x5F6D), ('N', 0x7B6D),
    ('O', 0x7B6F), ('P', 0x7BE4), ('Q', 0x7B79), ('R', 0x6BAD), ('S', 0x79CF), ('T', 0x7492),
    ('U', 0x5B6F), ('V', 0x5B52), ('W', 0x5B7D), ('X', 0x5AAD), ('Y', 0x5BD2), ('Z', 0x72A7),
    ('/', 0x12A4), ('-', 0x01C0), ('_', 0x0007), ('.', 0x0002), (':', 0x0410), ('=', 0x0E38),
    ('+', 0x05D0), ('<', 0x1511), ('>', 0x4454), ('(', 0x2922), (')', 0x224A), (' ', 0x0000),
    (';', 0x0414), ('?', 0x72C2),
];

const UNKNOWN_GLYPH: u16 = 0x0080;

/// Letters are case-folded to the single uppercase set.
fn glyph(c: char) -> Option<u16> {
    let c = c.to_ascii_uppercase();
    GLYPHS.iter().find(|(g, _)| *g == c).map(|&(_, bits)| bits)
}

/// Linear mix of two ARGB colors per channel; `t` = 0 is `a`, 1 is `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    [16, 8, 0].into_iter().fold(0xFF000000, |out, shift| {
        let ca = ((a >> shift) & 0xFF) as f32;
        let cb = ((b >> shift) & 0xFF) as f32;
        out | (((ca + (cb - ca) * t).round() as u32) << shift)
    })
}
