mod batch_cmd;
mod cache;
mod cli;
mod config;
mod convert;
mod idf_cmd;
mod logging;
mod report;
mod spi_cmd;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::PluvioConfig;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = PluvioConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Idf(args) => idf_cmd::run(args, &config),
        Command::Spi(args) => spi_cmd::run(args, &config),
        Command::Batch(args) => batch_cmd::run(args, &config),
    }
}
