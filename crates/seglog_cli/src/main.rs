//! Seglog CLI
//!
//! Command-line tools for a single segment's store and index files.
//!
//! # Commands
//!
//! - `inspect` - Display segment sizes, offsets and limits
//! - `verify` - Check that index entries point at well-formed records
//! - `dump` - Print records with their offsets and positions
//! - `append` - Append records from the command line

mod commands;

use clap::{Parser, Subcommand};
use commands::Target;
use seglog_storage::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Seglog command-line segment tools.
#[derive(Parser)]
#[command(name = "seglog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the segment files
    #[arg(global = true, short, long)]
    dir: Option<PathBuf>,

    /// Base offset of the segment
    #[arg(global = true, short, long, default_value = "0")]
    base_offset: u64,

    /// Index capacity in bytes
    #[arg(global = true, long)]
    max_index_bytes: Option<u64>,

    /// Store size at which the segment counts as full
    #[arg(global = true, long)]
    max_store_bytes: Option<u64>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display segment sizes, offsets and limits
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that every index entry points at a well-formed record
    Verify,

    /// Print records with their offsets and positions
    Dump {
        /// Maximum number of records to dump
        #[arg(short, long)]
        limit: Option<usize>,

        /// Start from this absolute offset (defaults to the base offset)
        #[arg(short, long)]
        offset: Option<u64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Append each value as a record
    Append {
        /// Record values
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::new().initial_offset(cli.base_offset);
    if let Some(bytes) = cli.max_index_bytes {
        config = config.max_index_bytes(bytes);
    }
    if let Some(bytes) = cli.max_store_bytes {
        config = config.max_store_bytes(bytes);
    }

    let target = |command: &str| -> Result<Target, Box<dyn std::error::Error>> {
        let dir = cli
            .dir
            .clone()
            .ok_or_else(|| format!("Segment directory required for {command}"))?;
        Ok(Target::new(dir, cli.base_offset, config))
    };

    match cli.command {
        Commands::Inspect { ref format } => {
            commands::inspect::run(&target("inspect")?, format)?;
        }
        Commands::Verify => {
            commands::verify::run(&target("verify")?)?;
        }
        Commands::Dump {
            limit,
            offset,
            ref format,
        } => {
            commands::dump::run(&target("dump")?, offset, limit, format)?;
        }
        Commands::Append { ref values } => {
            commands::append::run(&target("append")?, values)?;
        }
        Commands::Version => {
            println!("Seglog CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
