//! cloud_info: sample images and report what the particle field would get.

use std::path::PathBuf;

use photo_cloud::{expand_photo_paths, load_point_cloud, SamplerConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    let inputs: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if inputs.is_empty() {
        eprintln!("Usage: cloud_info <image or directory>...");
        std::process::exit(1);
    }

    let cfg = SamplerConfig::default();
    let mut rng = StdRng::seed_from_u64(0);

    println!();
    println!("  max dimension {}px, alpha > {}, capacity {}", cfg.max_dimension, cfg.min_alpha, cfg.capacity);
    println!();

    let mut failed = 0usize;
    for path in expand_photo_paths(&inputs) {
        match load_point_cloud(&path, &cfg, &mut rng) {
            Ok(cloud) => println!(
                "  ✓  {:<32} {:>6} samples  aspect {:.2}",
                cloud.label(), cloud.len(), cloud.aspect()
            ),
            Err(e) => {
                failed += 1;
                println!("  ✗  {}", e);
            }
        }
    }

    if failed > 0 {
        println!("\n  {} image(s) would be skipped.", failed);
    }
}
