//! Wayplan - progressive itinerary planner
//!
//! CLI entry point for planning trips and following remote streams.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use daycache::DayCache;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wayplan::cli::{Cli, Command, render_event, render_summary};
use wayplan::config::Config;
use wayplan::consumer::{ConsumerPhase, StreamConsumer};
use wayplan::domain::TripParams;
use wayplan::generator::SampleGenerator;
use wayplan::producer::StreamProducer;
use wayplan::stream::{StreamEvent, client, sse};

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wayplan")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = match cli_log_level.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{other}', defaulting to INFO");
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("wp.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;

    debug!("main: dispatching command");
    match cli.command {
        Command::Plan {
            destination,
            start,
            days,
            budget,
            travelers,
            preferences,
            trip_id,
            no_cache,
            json,
        } => {
            let params = TripParams {
                trip_id: trip_id.unwrap_or_else(|| derive_trip_id(&destination, start)),
                destination,
                start_date: start,
                total_days: days,
                travelers,
                budget,
                preferences,
            };
            cmd_plan(&config, params, no_cache, json).await
        }
        Command::Follow { url, json } => cmd_follow(&config, &url, json).await,
    }
}

/// Stable default trip id so repeated runs hit the same cache entries
fn derive_trip_id(destination: &str, start: NaiveDate) -> String {
    let slug: String = destination
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    format!("{}-{start}", slug.trim_matches('-'))
}

/// Run producer and consumer in-process over one channel
async fn cmd_plan(config: &Config, params: TripParams, no_cache: bool, json: bool) -> Result<()> {
    if params.total_days == 0 {
        return Err(eyre::eyre!("--days must be at least 1"));
    }
    if params.budget <= 0.0 {
        return Err(eyre::eyre!("--budget must be positive"));
    }

    info!(trip_id = %params.trip_id, days = params.total_days, "cmd_plan: starting session");

    let cache = if config.cache.enabled && !no_cache {
        let path = config.cache.resolved_path();
        match DayCache::open(&path) {
            Ok(cache) => Some(Arc::new(cache)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cmd_plan: cache unavailable, continuing without");
                None
            }
        }
    } else {
        None
    };

    let generator = Arc::new(SampleGenerator::with_delay(Duration::from_millis(config.generator.day_delay_ms)));
    let producer = StreamProducer::new(generator, cache, config);
    let (tx, rx) = mpsc::channel(config.stream.channel_capacity);

    let trip_id = params.trip_id.clone();
    let session = tokio::spawn(async move { producer.run(params, tx).await });

    let consumer = consume(rx, &trip_id, json).await?;

    if let Ok(Err(e)) = session.await
        && !e.is_cancellation()
    {
        warn!(error = %e, "cmd_plan: producer ended abnormally");
    }

    finish(consumer, json)
}

/// Consume a remote SSE stream
async fn cmd_follow(config: &Config, url: &str, json: bool) -> Result<()> {
    info!(url, "cmd_follow: connecting");

    let (tx, rx) = mpsc::channel(config.stream.channel_capacity);
    let endpoint = url.to_string();
    let connection = tokio::spawn(async move { client::follow(&endpoint, tx).await });

    let consumer = consume(rx, url, json).await?;

    if let Ok(Err(e)) = connection.await
        && !e.is_cancellation()
    {
        warn!(error = %e, "cmd_follow: stream ended abnormally");
    }

    finish(consumer, json)
}

/// Drain the event channel, printing each event as it arrives
async fn consume(mut rx: mpsc::Receiver<StreamEvent>, trip_id: &str, json: bool) -> Result<StreamConsumer> {
    let mut consumer = StreamConsumer::new();
    consumer.start(trip_id);

    while let Some(event) = rx.recv().await {
        if json {
            print!("{}", sse::encode(&event)?);
        } else {
            render_event(&event);
        }
        consumer.apply(event);
        if consumer.phase().is_terminal() {
            break;
        }
    }
    consumer.stream_closed();

    Ok(consumer)
}

fn finish(consumer: StreamConsumer, json: bool) -> Result<()> {
    if !json {
        render_summary(&consumer);
    }
    match consumer.phase() {
        ConsumerPhase::Error => {
            let message = consumer
                .errors()
                .last()
                .map_or_else(|| "session failed".to_string(), |e| e.message.clone());
            Err(eyre::eyre!(message))
        }
        _ => Ok(()),
    }
}
