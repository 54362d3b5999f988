use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::{
    io::{self, Read, Write},
    path::{Path, PathBuf},
};
use vitals_lib::{
    config::{read_config, VitalsConfig},
    io::{csv as csv_io, text as text_io},
    metrics::vitals::VitalsEstimator,
    monitor::{Submission, VitalsMonitor},
    signal::Sample,
};

#[derive(Parser)]
#[command(
    name = "vitals",
    version,
    about = "Heart rate and SpO2 estimation from paired IR/Red PPG samples"
)]
struct Cli {
    /// TOML file overriding window, pipeline and calibration constants
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate vitals over the first full window of samples
    Estimate {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Treat input as CSV with `ir` and `red`/`redir` columns
        #[arg(long)]
        csv: bool,
    },
    /// Like `estimate`, but print peaks, beat intervals and SpO2 ratios too
    Analyze {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        csv: bool,
    },
    /// Feed samples one by one through the sliding window, one JSON line per sample
    Stream {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        csv: bool,
    },
    /// Print the ratio -> SpO2 calibration table
    CalibrationTable,
}

/// Reply for a sample that did not complete a window yet.
#[derive(Serialize)]
struct Collecting {
    message: &'static str,
    progress: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = match cli.config.as_deref() {
        Some(path) => read_config(path)?,
        None => VitalsConfig::default(),
    };
    match cli.command {
        Commands::Estimate { input, csv } => cmd_estimate(&cfg, input.as_deref(), csv)?,
        Commands::Analyze { input, csv } => cmd_analyze(&cfg, input.as_deref(), csv)?,
        Commands::Stream { input, csv } => cmd_stream(&cfg, input.as_deref(), csv)?,
        Commands::CalibrationTable => cmd_calibration_table(&cfg)?,
    }
    Ok(())
}

fn read_samples(input: Option<&Path>, csv: bool) -> Result<Vec<Sample>> {
    match (input, csv) {
        (Some(path), true) => csv_io::read_samples_csv(path),
        (Some(path), false) => text_io::read_samples(path),
        (None, true) => csv_io::read_samples_csv_from(io::stdin().lock()),
        (None, false) => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_samples(&buf)
        }
    }
}

/// Split the first window worth of samples into IR and Red channels.
fn first_window(samples: &[Sample], capacity: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    if samples.len() < capacity {
        return Err(anyhow!(
            "need at least {} samples for one window, got {}",
            capacity,
            samples.len()
        ));
    }
    Ok(samples[..capacity].iter().map(|s| (s.ir, s.red)).unzip())
}

fn cmd_estimate(cfg: &VitalsConfig, input: Option<&Path>, csv: bool) -> Result<()> {
    let samples = read_samples(input, csv)?;
    let estimator = VitalsEstimator::new(cfg)?;
    let (ir, red) = first_window(&samples, estimator.required_samples())?;
    let vitals = estimator.estimate(&ir, &red)?;
    println!("{}", serde_json::to_string(&vitals)?);
    Ok(())
}

fn cmd_analyze(cfg: &VitalsConfig, input: Option<&Path>, csv: bool) -> Result<()> {
    let samples = read_samples(input, csv)?;
    let estimator = VitalsEstimator::new(cfg)?;
    let (ir, red) = first_window(&samples, estimator.required_samples())?;
    let analysis = estimator.analyze(&ir, &red)?;
    println!("{}", serde_json::to_string(&analysis)?);
    Ok(())
}

fn cmd_stream(cfg: &VitalsConfig, input: Option<&Path>, csv: bool) -> Result<()> {
    let samples = read_samples(input, csv)?;
    let mut monitor = VitalsMonitor::new(cfg)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for sample in &samples {
        let line = match monitor.submit_sample(sample.ir, sample.red)? {
            Submission::Pending(progress) => serde_json::to_string(&Collecting {
                message: "Collecting data",
                progress: format!("{} samples", progress),
            })?,
            Submission::Estimation(vitals) => serde_json::to_string(&vitals)?,
        };
        writeln!(out, "{}", line)?;
    }
    let status = monitor.status();
    info!(
        "streamed {} samples, window holds {}/{}",
        samples.len(),
        status.ir_len,
        status.capacity
    );
    Ok(())
}

fn cmd_calibration_table(cfg: &VitalsConfig) -> Result<()> {
    let estimator = VitalsEstimator::new(cfg)?;
    println!("{}", serde_json::to_string(estimator.table().values())?);
    Ok(())
}
