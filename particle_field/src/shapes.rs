//! Procedural target shapes.
//!
//! Every generator is deterministic: the RNG is reseeded from a fixed
//! per-shape seed on each call, so rebuilding the same shape always yields
//! the same positions.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEED: u64 = 0x5EED_F1E1D;

/// Closed set of procedural shapes offered by the parameter panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ShapeKind {
    #[default]
    Heart,
    Sphere,
    Torus,
    Spiral,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [ShapeKind::Heart, ShapeKind::Sphere, ShapeKind::Torus, ShapeKind::Spiral];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Heart  => "heart",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Torus  => "torus",
            ShapeKind::Spiral => "spiral",
        }
    }

    /// The next shape in panel order, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    fn seed(self) -> u64 { SEED + self as u64 }
}

/// Fill `out` (length a multiple of 3) with `out.len() / 3` xyz points.
pub fn generate(kind: ShapeKind, out: &mut [f32]) {
    let mut rng = StdRng::seed_from_u64(kind.seed());
    for p in out.chunks_exact_mut(3) {
        let [x, y, z] = match kind {
            ShapeKind::Heart  => heart(&mut rng),
            ShapeKind::Sphere => ball(&mut rng, 1.8),
            ShapeKind::Torus  => torus(&mut rng, 1.5, 0.5),
            ShapeKind::Spiral => spiral(&mut rng, 3, 2.4),
        };
        p[0] = x;
        p[1] = y;
        p[2] = z;
    }
}

/// Filled heart from the classic `16 sin³t` curve, with some depth.
fn heart<R: Rng>(rng: &mut R) -> [f32; 3] {
    let t: f32 = rng.gen_range(0.0..TAU);
    // sqrt keeps the fill uniform over the area.
    let fill = rng.gen::<f32>().sqrt();
    let x = 16.0 * t.sin().powi(3);
    let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    let scale = 0.11 * fill;
    let depth = rng.gen_range(-0.35..0.35) * fill;
    [x * scale, y * scale + 0.2, depth]
}

/// Uniform point inside a ball (rejection sampling).
fn ball<R: Rng>(rng: &mut R, radius: f32) -> [f32; 3] {
    loop {
        let x: f32 = rng.gen_range(-1.0..1.0);
        let y: f32 = rng.gen_range(-1.0..1.0);
        let z: f32 = rng.gen_range(-1.0..1.0);
        if x * x + y * y + z * z <= 1.0 {
            return [x * radius, y * radius, z * radius];
        }
    }
}

fn torus<R: Rng>(rng: &mut R, major: f32, minor: f32) -> [f32; 3] {
    let u: f32 = rng.gen_range(0.0..TAU);
    let v: f32 = rng.gen_range(0.0..TAU);
    let r = minor * rng.gen::<f32>().sqrt();
    let ring = major + r * v.cos();
    [ring * u.cos(), r * v.sin(), ring * u.sin()]
}

/// Flat galaxy with `arms` logarithmic-ish arms in the xz plane.
fn spiral<R: Rng>(rng: &mut R, arms: u32, radius: f32) -> [f32; 3] {
    let arm = rng.gen_range(0..arms) as f32;
    let d: f32 = rng.gen::<f32>().powf(0.7);
    let angle = d * 2.8 + arm * TAU / arms as f32 + rng.gen_range(-0.25..0.25);
    let dist = d * radius;
    let thickness = 0.15 * (1.0 - d);
    [dist * angle.cos(), rng.gen_range(-thickness..=thickness), dist * angle.sin()]
}
