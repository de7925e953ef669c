//! CLI argument parsing for daycache

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dc")]
#[command(author, version, about = "Inspect the wayplan day cache", long_about = None)]
pub struct Cli {
    /// Cache directory (default: ~/.local/share/wayplan/cache)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show statistics for a trip's cached days
    Stats {
        /// Trip ID
        #[arg(required = true)]
        trip_id: String,
    },

    /// List all trips with cached days
    List,

    /// Remove all cached days for a trip
    Clear {
        /// Trip ID
        #[arg(required = true)]
        trip_id: String,
    },
}

/// Resolve the cache directory from the flag or the platform default
pub fn resolve_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wayplan")
            .join("cache")
    })
}
