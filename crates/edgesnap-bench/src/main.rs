//! edgesnap-bench: CLI tool for running cached edge detection on an image.
//!
//! Loads an image file, runs one of the edge detectors through a fresh
//! cache one or more times, optionally snaps a query point to the nearest
//! edge, and reports timings and cache behaviour. Useful for:
//!
//! - Tuning hysteresis thresholds and gradient apertures on real images
//! - Checking that repeated runs are served from the cache
//! - Trying snap radii before wiring them into the annotation UI
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin edgesnap-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use edgesnap_core::{CacheStats, DetectionParams, EdgeDetector, EdgeMethod, EdgePoint};
use serde::Serialize;
use tracing::Level;

/// Cached edge detection and nearest-edge snapping for edgesnap.
///
/// Runs the selected detector on an image and prints per-run timing,
/// cache occupancy, and an optional snap result.
#[derive(Parser)]
#[command(name = "edgesnap-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Detection method: hysteresis (alias canny) or gradient (alias sobel).
    #[arg(long, default_value = "hysteresis")]
    method: String,

    /// Hysteresis low threshold.
    #[arg(long, default_value_t = DetectionParams::DEFAULT_LOW_THRESHOLD)]
    low_threshold: f32,

    /// Hysteresis high threshold.
    #[arg(long, default_value_t = DetectionParams::DEFAULT_HIGH_THRESHOLD)]
    high_threshold: f32,

    /// Gradient Sobel aperture (odd, 1-31).
    #[arg(long, default_value_t = DetectionParams::DEFAULT_KERNEL_SIZE)]
    kernel_size: u32,

    /// Gradient threshold on the normalized 0-255 magnitude.
    #[arg(long, default_value_t = DetectionParams::DEFAULT_GRADIENT_THRESHOLD)]
    threshold: u8,

    /// Full detection parameters as a JSON string.
    ///
    /// When provided, `--method` and the individual parameter flags are
    /// ignored. Example: `{"method":"gradient","kernel_size":5,"threshold":80}`.
    #[arg(long)]
    params_json: Option<String>,

    /// Query point to snap, as `X,Y` (may lie outside the image).
    #[arg(long, value_parser = parse_query)]
    query: Option<(i64, i64)>,

    /// Snap radius in pixels.
    #[arg(long, default_value_t = 10)]
    max_distance: u32,

    /// Cache capacity.
    #[arg(long, default_value_t = edgesnap_core::DEFAULT_CACHE_SIZE)]
    cache_size: usize,

    /// Number of runs; runs after the first should hit the cache.
    #[arg(long, default_value_t = 2, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Bypass the cache entirely.
    #[arg(long)]
    no_cache: bool,

    /// Output the report as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Log cache hits, misses, and evictions to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Parse `X,Y` into a query coordinate.
fn parse_query(s: &str) -> Result<(i64, i64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {s:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("invalid X in {s:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("invalid Y in {s:?}: {e}"))?;
    Ok((x, y))
}

/// Build the [`DetectionParams`] selected on the command line.
fn params_from_cli(cli: &Cli) -> Result<DetectionParams, String> {
    if let Some(ref json) = cli.params_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --params-json: {e}"));
    }

    let method: EdgeMethod = cli.method.parse().map_err(|e| format!("{e}"))?;
    Ok(match method {
        EdgeMethod::Hysteresis => DetectionParams::hysteresis(cli.low_threshold, cli.high_threshold),
        EdgeMethod::Gradient => DetectionParams::gradient(cli.kernel_size, cli.threshold),
    })
}

/// Result of one detection run.
#[derive(Serialize)]
struct RunReport {
    run: usize,
    #[serde(serialize_with = "serialize_millis")]
    duration: Duration,
    cached_before: usize,
    cached_after: usize,
    edge_pixels: u64,
}

/// Everything printed at the end.
#[derive(Serialize)]
struct Report {
    image: String,
    width: u32,
    height: u32,
    params: DetectionParams,
    runs: Vec<RunReport>,
    query: Option<(i64, i64)>,
    max_distance: u32,
    nearest: Option<EdgePoint>,
    nearest_distance: Option<f64>,
    cache: CacheStats,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

impl Report {
    fn human(&self) -> String {
        let mut out = format!(
            "Image: {} ({}x{})\nParams: {:?}\n\n{:<6} {:>12} {:>8} {:>8} {:>12}\n{}\n",
            self.image,
            self.width,
            self.height,
            self.params,
            "Run",
            "Time (ms)",
            "Before",
            "After",
            "Edge px",
            "-".repeat(50),
        );
        for run in &self.runs {
            out.push_str(&format!(
                "{:<6} {:>12.3} {:>8} {:>8} {:>12}\n",
                run.run,
                run.duration.as_secs_f64() * 1000.0,
                run.cached_before,
                run.cached_after,
                run.edge_pixels,
            ));
        }
        if let Some((x, y)) = self.query {
            match (self.nearest, self.nearest_distance) {
                (Some(p), Some(d)) => out.push_str(&format!(
                    "\nSnap ({x}, {y}) within {}: ({}, {}) at distance {d:.3}\n",
                    self.max_distance, p.x, p.y,
                )),
                _ => out.push_str(&format!(
                    "\nSnap ({x}, {y}) within {}: no edge\n",
                    self.max_distance,
                )),
            }
        }
        out.push_str(&format!(
            "\nCache: {}/{} entries\n",
            self.cache.count, self.cache.max_size,
        ));
        for key in &self.cache.keys {
            out.push_str(&format!("  {key}\n"));
        }
        out
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let params = match params_from_cli(&cli) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image = match image::open(&cli.image_path) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut detector = EdgeDetector::with_capacity(cli.cache_size);
    let mut runs = Vec::with_capacity(cli.runs);
    let mut last_mask = None;

    for run in 1..=cli.runs {
        let cached_before = detector.cache().len();
        let start = Instant::now();
        let mask = match detector.detect(&image, &params, !cli.no_cache) {
            Ok(mask) => mask,
            Err(e) => {
                eprintln!("Detection error: {e}");
                return ExitCode::FAILURE;
            }
        };
        runs.push(RunReport {
            run,
            duration: start.elapsed(),
            cached_before,
            cached_after: detector.cache().len(),
            edge_pixels: mask.edge_pixel_count(),
        });
        last_mask = Some(mask);
    }

    let nearest = match (cli.query, &last_mask) {
        (Some(query), Some(mask)) => edgesnap_core::nearest_point(mask, query, cli.max_distance),
        _ => None,
    };

    let report = Report {
        image: cli.image_path.display().to_string(),
        width: image.width(),
        height: image.height(),
        params,
        runs,
        query: cli.query,
        max_distance: cli.max_distance,
        nearest,
        nearest_distance: nearest.zip(cli.query).map(|(p, q)| p.distance_to(q)),
        cache: detector.cache_stats(),
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", report.human());
    }

    ExitCode::SUCCESS
}
