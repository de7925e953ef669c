use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use daycache::DayCache;
use daycache::cli::{Cli, Command, resolve_path};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let path = resolve_path(cli.path);

    info!("daycache starting at {}", path.display());

    match cli.command {
        Command::Stats { trip_id } => {
            let cache = DayCache::open(&path)?;
            let stats = cache.stats(&trip_id)?;
            println!("Trip: {}", trip_id.cyan());
            println!("  Cached days: {}", stats.entry_count);
            println!("  Total bytes: {}", stats.total_bytes);
            match stats.oldest_age {
                Some(age) => println!("  Oldest entry: {}s ago", age.as_secs()),
                None => println!("  Oldest entry: -"),
            }
        }
        Command::List => {
            let cache = DayCache::open(&path)?;
            let trips = cache.list_trips()?;
            if trips.is_empty() {
                println!("No cached trips");
            } else {
                for trip in trips {
                    println!("{}", trip);
                }
            }
        }
        Command::Clear { trip_id } => {
            let cache = DayCache::open(&path)?;
            let removed = cache.clear(&trip_id)?;
            println!("{} Removed {} cached day(s) for {}", "✓".green(), removed, trip_id);
        }
    }

    Ok(())
}
