mod analysis;
mod config;
mod engine;
mod evolve;
mod gfs;
mod manager;
mod meanfield;
mod model;
mod network;
mod ode;
mod percolation;
mod stats;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Perform one stochastic Gillespie run.
    Run,

    /// Integrate the degree-based mean-field SIR system.
    MeanField,

    /// Compute the generating-function outbreak size.
    Outbreak,

    /// Perform a bond-percolation experiment.
    Percolation,

    /// Integrate the addition-deletion degree equations.
    Evolve,

    /// Summarize all stochastic runs.
    Analyze,

    /// Remove run directories and derived outputs.
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

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Run => mgr.run_stochastic()?,
        Command::MeanField => mgr.run_mean_field()?,
        Command::Outbreak => mgr.run_outbreak()?,
        Command::Percolation => mgr.run_percolation()?,
        Command::Evolve => mgr.run_evolve()?,
        Command::Analyze => mgr.run_analysis()?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
