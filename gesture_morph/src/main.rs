//! gesture_morph: interactive entry point.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use gesture_morph::app::{run, AppConfig};
use particle_field::{ShapeKind, PALETTE};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gesture_morph=info,photo_cloud=info")),
        )
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Morph - Hand-Driven Particle Photo Wall       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Keyboard simulation  (use --features leap for hardware)");
    println!();

    let photo_paths: Vec<PathBuf> = std::env::args()
        .skip(1)
        .filter(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .collect();

    let mut cfg = if std::env::args().any(|a| a == "--quick") {
        println!("  Quick-start: heart, 20000 particles, default gesture timings\n");
        AppConfig::default()
    } else {
        configure_interactively()
    };
    if !photo_paths.is_empty() {
        cfg.photo_paths = photo_paths;
    }

    println!();
    println!("  Photos from: {}", cfg.photo_paths.iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", "));
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure_interactively() -> AppConfig {
    let mut cfg = AppConfig::default();

    cfg.field.capacity = read_line("  Particle count 1000–100000 (default 20000): ")
        .trim().parse::<usize>().unwrap_or(20_000)
        .clamp(1_000, 100_000);

    println!("  Shape: 1=Heart 2=Sphere 3=Torus 4=Spiral");
    cfg.params.shape = match read_line("  Choice (default 1): ").trim() {
        "2" => ShapeKind::Sphere,
        "3" => ShapeKind::Torus,
        "4" => ShapeKind::Spiral,
        _   => ShapeKind::Heart,
    };

    println!("  Color: 1=Rose 2=Sky 3=Amber 4=Mint 5=Violet 6=White");
    let color = read_line("  Choice (default 1): ").trim().parse::<usize>().unwrap_or(1);
    cfg.params.color = PALETTE[color.clamp(1, PALETTE.len()) - 1];

    let smoothing: f32 = read_line("  Morph smoothing 0.01–0.5 (default 0.08): ")
        .trim().parse().unwrap_or(0.08);
    cfg.field.smoothing = smoothing.clamp(0.01, 0.5);

    let idle: u64 = read_line("  Autoplay idle seconds (default 5): ")
        .trim().parse().unwrap_or(5);
    cfg.navigation.idle_interval = Duration::from_secs(idle.clamp(1, 600));

    let hold: u64 = read_line("  Select hold ms (default 1200): ")
        .trim().parse().unwrap_or(1200);
    cfg.navigation.hold_duration = Duration::from_millis(hold.clamp(200, 10_000));

    cfg
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
