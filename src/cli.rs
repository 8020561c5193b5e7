use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Rainfall IDF and SPI analysis for weather-station archives.
#[derive(Parser)]
#[command(
    name = "pluvio",
    version,
    about = "Rainfall IDF curve fitting and SPI drought index for weather stations"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file (defaults apply when omitted).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Fit IDF curves for one station file.
    Idf(StationArgs),
    /// Compute the monthly SPI for one station file.
    Spi(StationArgs),
    /// Run IDF and SPI for every station file in a directory.
    Batch(BatchArgs),
}

/// Arguments shared by the single-station subcommands.
#[derive(clap::Args)]
pub struct StationArgs {
    /// Path to the station CSV file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path for the JSON report (stdout when omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `batch` subcommand.
#[derive(clap::Args)]
pub struct BatchArgs {
    /// Directory holding station CSV files.
    #[arg(long = "input-dir")]
    pub input_dir: PathBuf,

    /// Directory receiving `<code>.json` reports and `summary.json`.
    #[arg(long = "output-dir")]
    pub output_dir: PathBuf,

    /// Override the worker thread count from config.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Recompute every station, ignoring and not updating the result cache.
    #[arg(long = "no-cache")]
    pub no_cache: bool,
}
