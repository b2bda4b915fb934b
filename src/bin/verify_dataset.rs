//! Spot-check dataset labels by rendering box overlays for random images.
//!
//! Usage: `verify-dataset data.yaml --samples 5 --out overlays`

use anyhow::{Context, Result};
use clap::Parser;
use detbench::dataset::{DatasetDescriptor, SampleLoader};
use detbench::verify::{DatasetVerifier, OverlayRenderer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Render label overlays for a random sample of training images")]
struct Args {
    /// Dataset descriptor (data.yaml)
    config: PathBuf,

    /// Number of images to check
    #[arg(short = 'n', long, default_value_t = 3)]
    samples: usize,

    /// Directory for rendered overlays
    #[arg(short, long, default_value = "overlays")]
    out: PathBuf,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Check the validation split instead of the training split
    #[arg(long)]
    val: bool,
}

fn run(args: &Args) -> Result<bool> {
    let descriptor = DatasetDescriptor::load(&args.config)
        .with_context(|| format!("Failed to load dataset descriptor {}", args.config.display()))?;

    let image_dir = if args.val {
        descriptor
            .val_dir()
            .context("Dataset descriptor declares no val split")?
    } else {
        descriptor.train_dir()
    };
    info!(dir = %image_dir.display(), "Checking dataset directory");

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut verifier = DatasetVerifier::new(SampleLoader::new(), OverlayRenderer::new(&args.out))
        .with_class_names(descriptor.class_names().clone());
    let report = verifier.verify(image_dir, args.samples, &mut rng)?;

    println!("Checked {} image(s) from {}", report.samples, image_dir.display());
    println!("  overlays written : {}", report.rendered);
    println!("  missing labels   : {}", report.missing_labels);
    println!("  malformed lines  : {}", report.malformed_lines);
    println!("  out-of-range box : {}", report.out_of_bounds_boxes);
    println!("  unreadable image : {}", report.skipped_images);
    for path in verifier.renderer().saved() {
        println!("  -> {}", path.display());
    }

    if !report.is_clean() {
        warn!("Problems found, inspect the overlays above");
    }
    Ok(report.rendered > 0)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("No overlay could be rendered");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
