//! # photo_cloud
//!
//! Converts raster images into [`PointCloud`]s: capped sets of colored 2D
//! samples taken from the image's non-transparent pixels.
//!
//! * The image is first downsampled to a bounded size so the cost per image
//!   stays constant regardless of input resolution.
//! * Pixels at or below the opacity threshold are dropped, which strips
//!   transparent backgrounds from cut-out photos.
//! * When more samples survive than the particle buffer can hold, the set is
//!   shuffled with the caller's RNG and truncated.  This is uniform random
//!   subsampling, not a spatial simplification.
//!
//! ```rust
//! use image::{DynamicImage, Rgba, RgbaImage};
//! use photo_cloud::{build_point_cloud, SamplerConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 32, Rgba([255, 0, 0, 255])));
//! let cfg = SamplerConfig { capacity: 1000, ..SamplerConfig::default() };
//! let cloud = build_point_cloud(&img, "red", &cfg, &mut StdRng::seed_from_u64(7));
//! assert_eq!(cloud.len(), 1000);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

/// File extensions the loader will try to decode.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

// ════════════════════════════════════════════════════════════════════════════
// Data
// ════════════════════════════════════════════════════════════════════════════

/// One colored sample.  `x ∈ [-aspect, aspect]`, `y ∈ [-1, 1]` (up is +y),
/// channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointSample {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// The samples taken from one image.  Immutable once built.
#[derive(Clone, Debug)]
pub struct PointCloud {
    label:   String,
    aspect:  f32,
    samples: Vec<PointSample>,
}

impl PointCloud {
    /// Wrap already-sampled points, e.g. from a procedural source.
    pub fn new(label: impl Into<String>, aspect: f32, samples: Vec<PointSample>) -> Self {
        PointCloud { label: label.into(), aspect, samples }
    }

    pub fn label(&self) -> &str { &self.label }
    /// Width / height of the sampled image.
    pub fn aspect(&self) -> f32 { self.aspect }
    pub fn samples(&self) -> &[PointSample] { &self.samples }
    pub fn len(&self) -> usize { self.samples.len() }
    pub fn is_empty(&self) -> bool { self.samples.is_empty() }
}

// ════════════════════════════════════════════════════════════════════════════
// Configuration / errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Longest side after downsampling, in pixels.
    pub max_dimension: u32,
    /// Pixels with alpha at or below this are skipped.
    pub min_alpha:     u8,
    /// Maximum number of samples kept (the particle count `N`).
    pub capacity:      usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            max_dimension: 200,
            min_alpha:     20,
            capacity:      20_000,
        }
    }
}

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path:   PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{} has no opaque pixels", .path.display())]
    NoOpaquePixels { path: PathBuf },
    #[error("cannot list {}: {source}", .path.display())]
    ReadDir {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// Sampling
// ════════════════════════════════════════════════════════════════════════════

/// Sample `image` into a cloud of at most `config.capacity` points.
pub fn build_point_cloud<R: Rng + ?Sized>(
    image:  &DynamicImage,
    label:  &str,
    config: &SamplerConfig,
    rng:    &mut R,
) -> PointCloud {
    let (w, h) = image.dimensions();
    let max = config.max_dimension.max(1);
    let rgba = if w > max || h > max {
        image.resize(max, max, FilterType::Triangle).to_rgba8()
    } else {
        image.to_rgba8()
    };

    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return PointCloud { label: label.to_string(), aspect: 1.0, samples: Vec::new() };
    }
    let aspect = w as f32 / h as f32;

    let mut samples: Vec<PointSample> = rgba.enumerate_pixels()
        .filter(|(_, _, p)| p[3] > config.min_alpha)
        .map(|(px, py, p)| PointSample {
            x: ((px as f32 + 0.5) / w as f32 * 2.0 - 1.0) * aspect,
            y: 1.0 - (py as f32 + 0.5) / h as f32 * 2.0,
            r: p[0] as f32 / 255.0,
            g: p[1] as f32 / 255.0,
            b: p[2] as f32 / 255.0,
        })
        .collect();

    if samples.len() > config.capacity {
        debug!(label, found = samples.len(), capacity = config.capacity, "subsampling");
        samples.shuffle(rng);
        samples.truncate(config.capacity);
    }

    PointCloud { label: label.to_string(), aspect, samples }
}

/// Decode one file and sample it.
pub fn load_point_cloud<R: Rng + ?Sized>(
    path:   &Path,
    config: &SamplerConfig,
    rng:    &mut R,
) -> Result<PointCloud, SampleError> {
    let image = image::open(path).map_err(|source| SampleError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let label = path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let cloud = build_point_cloud(&image, &label, config, rng);
    if cloud.is_empty() {
        return Err(SampleError::NoOpaquePixels { path: path.to_path_buf() });
    }
    Ok(cloud)
}

/// Load every path in order, skipping (and logging) the ones that fail.
pub fn load_photo_clouds<R: Rng + ?Sized>(
    paths:  &[PathBuf],
    config: &SamplerConfig,
    rng:    &mut R,
) -> Vec<PointCloud> {
    let mut clouds = Vec::with_capacity(paths.len());
    for path in paths {
        match load_point_cloud(path, config, rng) {
            Ok(cloud) => {
                debug!(label = cloud.label(), samples = cloud.len(), "loaded photo");
                clouds.push(cloud);
            }
            Err(e) => warn!("skipping photo: {}", e),
        }
    }
    info!(loaded = clouds.len(), requested = paths.len(), "photo clouds ready");
    clouds
}

// ════════════════════════════════════════════════════════════════════════════
// Path discovery
// ════════════════════════════════════════════════════════════════════════════

/// True if the file extension is one the loader knows.
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by name.
pub fn collect_image_paths(dir: &Path) -> Result<Vec<PathBuf>, SampleError> {
    let read_err = |source| SampleError::ReadDir { path: dir.to_path_buf(), source };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Expand a mix of files and directories into a flat list of image paths.
/// Unreadable directories are logged and skipped.
pub fn expand_photo_paths(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            match collect_image_paths(input) {
                Ok(found) => out.extend(found),
                Err(e)    => warn!("{}", e),
            }
        } else {
            out.push(input.clone());
        }
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
