mod analysis;
mod config;
mod dataset;
mod error;
mod manager;
mod plot;
mod stats;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory for results and charts.
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Optional TOML file with chart settings.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the hike table.
    Table,

    /// Fit the elevation trend and distribution.
    Analyze,

    /// Fit and render both charts.
    Plot,

    /// Remove generated results and charts.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.out_dir, args.config).context("failed to construct mgr")?;

    match args.command {
        Command::Table => mgr.print_table()?,
        Command::Analyze => {
            mgr.run_analysis()?;
        }
        Command::Plot => mgr.run_plots()?,
        Command::Clean => mgr.clean_outputs()?,
    }

    Ok(())
}
