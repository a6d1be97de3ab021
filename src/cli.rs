//! Command-line surface: load config/genome/snapshot, then either run a
//! fixed number of headless ticks or hand control to the terminal UI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fungera", about = "A 2D artificial-life simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Run without the terminal UI, even under the default `run` command.
    #[arg(long, global = true)]
    pub headless: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a genome (and optionally a config/snapshot) and run the
    /// simulation.
    Run {
        /// Path to a TOML config file. Falls back to defaults if absent.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to an `initial.gen`-style genome file. Required unless
        /// `--load-snapshot` is given.
        #[arg(long)]
        genome: Option<PathBuf>,

        /// Resume from a previously saved snapshot instead of a fresh
        /// ancestor.
        #[arg(long)]
        load_snapshot: Option<PathBuf>,

        /// Run this many ticks headlessly and print a summary, rather than
        /// handing control to the terminal UI.
        #[arg(long)]
        cycles: Option<u64>,
    },
}
