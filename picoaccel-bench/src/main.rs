//! picoaccel-bench drives picoaccel-core with a synthetic synthesis workload
//! and prints a JSON report.
//!
//! ```text
//! picoaccel-bench [--config <file.json>] [--iterations <n>] [--seed <u64>] [--output <file.json>]
//! ```

mod report;
mod workload;

use std::path::PathBuf;

use anyhow::{bail, Context};
use picoaccel_core::cache::{DESKTOP_CAPACITY, EMBEDDED_CAPACITY};
use picoaccel_core::{AccelConfig, AccelStage, WindowKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use report::Report;

const UTTERANCES_PER_ITERATION: usize = 40;
const FRAMES_PER_ITERATION: usize = 64;
const FIXED_POINT_SAMPLES: usize = 4096;

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    iterations: usize,
    seed: u64,
    output: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut config = None;
    let mut iterations: usize = 1;
    let mut seed: u64 = 0x00C0_FFEE;
    let mut output = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --config");
                };
                config = Some(PathBuf::from(v));
            }
            "--iterations" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --iterations");
                };
                iterations = v
                    .parse::<usize>()
                    .context("invalid value for --iterations")?
                    .clamp(1, 100);
            }
            "--seed" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --seed");
                };
                seed = v.parse().context("invalid value for --seed")?;
            }
            "--output" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --output");
                };
                output = Some(PathBuf::from(v));
            }
            "--help" | "-h" => {
                println!(
                    "Usage: picoaccel-bench [--config <file.json>] [--iterations <n>] \
                     [--seed <u64>] [--output <file.json>]"
                );
                std::process::exit(0);
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(Args {
        config,
        iterations,
        seed,
        output,
    })
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AccelConfig> {
    let Some(path) = path else {
        return Ok(AccelConfig::for_build());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let mut config: AccelConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.normalize();
    Ok(config)
}

/// One pass through the facade the way a synthesizer would use it.
fn smoke_stage(config: &AccelConfig) -> anyhow::Result<()> {
    let mut stage = AccelStage::<DESKTOP_CAPACITY>::new(config.clone())?;
    let n = config.transform_len as usize;
    let mut frame: Vec<f32> = (0..n).map(|i| (i as f32 * 0.05).sin() * 0.8).collect();
    stage.scale_frame(&mut frame, 0.5);
    let mut power = vec![0.0f32; n];
    stage.frame_power_spectrum(&frame, Some(WindowKind::Hann), &mut power)?;
    let peak = power[..n / 2]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(bin, _)| bin);
    info!(peak_bin = peak, "stage smoke pass");
    stage.release();
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let args = parse_args()?;
    let config = load_config(args.config.as_ref())?;
    info!(?config, iterations = args.iterations, seed = args.seed, "benchmark starting");

    smoke_stage(&config)?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let utterances = UTTERANCES_PER_ITERATION * args.iterations;
    let frames = FRAMES_PER_ITERATION * args.iterations;

    let cache = if config.cache_enabled {
        vec![
            workload::run_cache::<EMBEDDED_CAPACITY>(&mut rng, utterances)?,
            workload::run_cache::<DESKTOP_CAPACITY>(&mut rng, utterances)?,
        ]
    } else {
        warn!("cache disabled in config; skipping cache workload");
        Vec::new()
    };

    let mut transforms = Vec::new();
    for (kind, len) in workload::transform_matrix(&config) {
        transforms.push(workload::run_transform(&mut rng, kind, len, frames)?);
    }

    let fixed_point = workload::run_fixed_point(&mut rng, FIXED_POINT_SAMPLES);

    let report = Report {
        config,
        seed: args.seed,
        iterations: args.iterations,
        cache,
        transforms,
        fixed_point,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, &json)
                .with_context(|| format!("writing report {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("picoaccel_core=info,picoaccel_bench=info")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("benchmark failed: {e:#}");
        std::process::exit(1);
    }
}
