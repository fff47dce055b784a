//! # particle_field
//!
//! A fixed-capacity particle buffer that morphs toward a target.
//!
//! The field keeps four parallel arrays of `N × 3` floats: current position,
//! current color, target position, target color.  [`ParticleField::set_target`]
//! rewrites only the target arrays; [`ParticleField::tick`] moves every
//! current component a fraction of the way toward its target.  Because the
//! current arrays are never reset, swapping targets mid-morph stays visually
//! continuous.
//!
//! Convergence is asymptotic.  Nothing ever snaps to the target and no
//! consumer needs it to.

use photo_cloud::PointCloud;
use tracing::debug;

pub mod shapes;

pub use shapes::ShapeKind;

/// Frame rate at which `smoothing` is applied verbatim.
pub const REFERENCE_FPS: f32 = 60.0;

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfig {
    /// Particle count `N`.
    pub capacity:    usize,
    /// Fraction of the remaining distance covered per reference frame.
    pub smoothing:   f32,
    /// World-space magnification applied to photo sample positions.
    pub photo_scale: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            capacity:    20_000,
            smoothing:   0.08,
            photo_scale: 2.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FieldParams: live-edited panel values
// ════════════════════════════════════════════════════════════════════════════

/// Flat colors offered for procedural shapes.
pub const PALETTE: [[f32; 3]; 6] = [
    [1.00, 0.27, 0.45],  // rose
    [0.25, 0.70, 1.00],  // sky
    [1.00, 0.80, 0.20],  // amber
    [0.45, 1.00, 0.55],  // mint
    [0.80, 0.45, 1.00],  // violet
    [1.00, 1.00, 1.00],  // white
];

pub const MIN_PARTICLE_SIZE: f32 = 1.0;
pub const MAX_PARTICLE_SIZE: f32 = 6.0;

/// Values the parameter panel exposes.  The field reads them on every
/// rebuild and never writes them.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldParams {
    pub shape:         ShapeKind,
    pub color:         [f32; 3],
    /// Rendered point size in pixels.
    pub particle_size: f32,
}

impl Default for FieldParams {
    fn default() -> Self {
        FieldParams {
            shape:         ShapeKind::Heart,
            color:         PALETTE[0],
            particle_size: 2.0,
        }
    }
}

impl FieldParams {
    pub fn next_shape(&mut self) { self.shape = self.shape.next(); }

    /// Advance to the next palette entry (or the first, for a custom color).
    pub fn next_color(&mut self) {
        let i = PALETTE.iter().position(|c| *c == self.color).map_or(0, |i| i + 1);
        self.color = PALETTE[i % PALETTE.len()];
    }

    pub fn grow(&mut self) {
        self.particle_size = (self.particle_size + 0.5).min(MAX_PARTICLE_SIZE);
    }

    pub fn shrink(&mut self) {
        self.particle_size = (self.particle_size - 0.5).max(MIN_PARTICLE_SIZE);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ParticleField
// ════════════════════════════════════════════════════════════════════════════

/// What the field should morph toward.
#[derive(Clone, Copy, Debug)]
pub enum TargetSource<'a> {
    /// The procedural shape selected in [`FieldParams`].
    Shape,
    Cloud(&'a PointCloud),
}

pub struct ParticleField {
    config:      FieldConfig,
    current_pos: Vec<f32>,
    current_col: Vec<f32>,
    target_pos:  Vec<f32>,
    target_col:  Vec<f32>,
}

impl ParticleField {
    /// All four buffers start at zero: every particle sits black at the origin.
    pub fn new(config: FieldConfig) -> Self {
        let len = config.capacity * 3;
        ParticleField {
            config,
            current_pos: vec![0.0; len],
            current_col: vec![0.0; len],
            target_pos:  vec![0.0; len],
            target_col:  vec![0.0; len],
        }
    }

    pub fn capacity(&self) -> usize { self.config.capacity }
    pub fn config(&self) -> &FieldConfig { &self.config }

    /// Rebuild both target arrays from `source`.  Lengths never change.
    pub fn set_target(&mut self, source: TargetSource<'_>, params: &FieldParams) {
        match source {
            TargetSource::Shape => {
                shapes::generate(params.shape, &mut self.target_pos);
                for c in self.target_col.chunks_exact_mut(3) {
                    c.copy_from_slice(&params.color);
                }
                debug!(shape = params.shape.name(), "target rebuilt from shape");
            }
            TargetSource::Cloud(cloud) => {
                self.target_pos.fill(0.0);
                self.target_col.fill(0.0);
                let scale = self.config.photo_scale;
                let slots = self.target_pos.chunks_exact_mut(3)
                    .zip(self.target_col.chunks_exact_mut(3));
                for ((p, c), s) in slots.zip(cloud.samples()) {
                    p.copy_from_slice(&[s.x * scale, s.y * scale, 0.0]);
                    c.copy_from_slice(&[s.r, s.g, s.b]);
                }
                debug!(photo = cloud.label(), samples = cloud.len(), "target rebuilt from photo");
            }
        }
    }

    /// Advance the morph by `dt` seconds.
    ///
    /// The per-frame factor is `smoothing` at [`REFERENCE_FPS`] and is scaled
    /// for other frame times, so `tick(0.0)` leaves everything untouched.
    pub fn tick(&mut self, dt: f32) {
        if dt <= 0.0 { return; }
        let k = self.config.smoothing.clamp(0.0, 1.0);
        let alpha = 1.0 - (1.0 - k).powf(dt * REFERENCE_FPS);

        approach(&mut self.current_pos, &self.target_pos, alpha);
        approach(&mut self.current_col, &self.target_col, alpha);
    }

    // ── Accessors for the renderer ────────────────────────────────────────

    pub fn positions(&self)        -> &[f32] { &self.current_pos }
    pub fn colors(&self)           -> &[f32] { &self.current_col }
    pub fn target_positions(&self) -> &[f32] { &self.target_pos }
    pub fn target_colors(&self)    -> &[f32] { &self.target_col }
}

fn approach(current: &mut [f32], target: &[f32], alpha: f32) {
    for (c, t) in current.iter_mut().zip(target) {
        *c += (t - *c) * alpha;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
