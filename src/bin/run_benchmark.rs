//! Train and validate every configured model, then export a ranked table.
//!
//! Usage: `run-benchmark session.yaml [--dry-run]`
//!
//! Exit status is 0 only if at least one run succeeded and the CSV was written.

use anyhow::{Context, Result};
use clap::Parser;
use detbench::config::SessionConfig;
use detbench::experiment::{ExperimentRunner, ResultsAggregator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(version, about = "Benchmark a queue of detection models under one hyperparameter profile")]
struct Args {
    /// Session config (YAML)
    config: PathBuf,

    /// Print the resolved plan without training anything
    #[arg(long)]
    dry_run: bool,
}

fn print_plan(config: &SessionConfig) -> Result<()> {
    println!("Session : {}", config.session());
    println!("Dataset : {}", config.dataset().display());
    println!("Export  : {}", config.export_path().display());
    println!(
        "Trainer : {} {}",
        config.trainer().program.display(),
        config.trainer().args.join(" ")
    );
    println!("Profile :");
    println!("{}", serde_json::to_string_pretty(&config.profile().to_json())?);
    println!("Models  :");
    for (idx, model) in config.models().iter().enumerate() {
        println!("  {}. {} ({})", idx + 1, model.display_name(), model.weight_reference());
    }
    Ok(())
}

fn run(args: &Args) -> Result<bool> {
    let config = SessionConfig::load(&args.config)
        .with_context(|| format!("Failed to load session config {}", args.config.display()))?;

    if args.dry_run {
        print_plan(&config)?;
        return Ok(true);
    }

    let names: Vec<&str> = config.models().iter().map(|m| m.display_name()).collect();
    info!(models = ?names, profile = %config.profile().label(), "Queued models");

    let mut results = ResultsAggregator::new();
    let runner = ExperimentRunner::new(&config, config.command_trainer());
    let summary = runner.run(config.models(), &mut results);

    let failures = results.failures();
    if !failures.is_empty() {
        println!("Failed runs:");
        for (model, reason) in &failures {
            println!("  {model}: {reason}");
        }
    }

    let path = match results.export_csv(config.export_path()) {
        Ok(path) => path,
        Err(e) => {
            error!("{e}");
            return Ok(false);
        }
    };

    println!();
    println!(
        "{}/{} runs succeeded; results saved to {}",
        summary.succeeded,
        summary.attempted,
        path.display()
    );
    print!("{}", results.render_table());
    Ok(true)
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
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
