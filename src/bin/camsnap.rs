//! camsnap - capture one snapshot from a configured camera.
//!
//! Loads the deployment config, makes sure both output directories exist,
//! runs the resolve/fetch/persist sequence once, and exits. A non-zero exit
//! carries a message naming the stage that failed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use camsnap::{run_capture, CaptureConfig};

#[derive(Parser, Debug)]
#[command(name = "camsnap", version, about = "Single-shot camera snapshot capture")]
struct Args {
    /// Path to the deployment TOML config.
    #[arg(short, long, env = "CAMSNAP_CONFIG")]
    config: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = CaptureConfig::load(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;

    // Precondition of the persistence writer: both directories exist.
    std::fs::create_dir_all(&cfg.output.original_dir).with_context(|| {
        format!("create output dir {}", cfg.output.original_dir.display())
    })?;
    std::fs::create_dir_all(&cfg.output.cropped_dir).with_context(|| {
        format!("create output dir {}", cfg.output.cropped_dir.display())
    })?;

    log::info!(
        "capturing from {}:{} (crop {},{} - {},{})",
        cfg.camera.host,
        cfg.camera.port,
        cfg.crop.left,
        cfg.crop.top,
        cfg.crop.right,
        cfg.crop.bottom
    );

    let report = run_capture(&cfg)?;

    println!(
        "captured {}x{} via {} url",
        report.width, report.height, report.uri.provenance
    );
    println!("original: {}", report.original_path.display());
    println!("cropped : {}", report.cropped_path.display());
    Ok(())
}
