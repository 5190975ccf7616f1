//! # winstat CLI
//!
//! Command-line interface for POSIX-style file metadata on Windows.
//!
//! ## Commands
//!
//! - `winstat stat <path>...` - Print metadata for one or more paths
//! - `winstat config` - Show the active configuration
//! - `winstat config --init` - Write a default configuration file
//!
//! ## Example Usage
//!
//! ```bash
//! # Metadata for a file, in the style of stat(1)
//! winstat stat C:\Windows\notepad.exe
//!
//! # Several paths as JSON
//! winstat stat --output json NUL C:\pagefile.sys .
//! ```

mod app;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use winstat_core::{Config, OutputFormat};

/// winstat - POSIX stat for Windows files
#[derive(Parser)]
#[command(name = "winstat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "WINSTAT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print metadata for one or more paths
    Stat {
        /// Paths to inspect; relative paths are resolved against the working directory
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format (text, json); defaults to the configured format
        #[arg(short, long)]
        output: Option<OutputFormat>,

        /// Print timestamps in UTC
        #[arg(short, long)]
        utc: bool,
    },

    /// Show or create the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(short, long, requires = "init")]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Setup logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.general.log_level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    // Execute command
    match cli.command {
        Commands::Stat { paths, output, utc } => commands::stat::run(config, &paths, output, utc),
        Commands::Config { init, force } => commands::config::run(&config, cli.config, init, force),
    }
}
