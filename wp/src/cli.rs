//! CLI command definitions and terminal rendering

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::consumer::{ConsumerPhase, StreamConsumer};
use crate::domain::{ItineraryDay, Verdict};
use crate::stream::StreamEvent;

/// Wayplan - progressive travel itinerary planner
#[derive(Parser)]
#[command(name = "wp", about = "Streams day-by-day travel itineraries with budget and logistics validation", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan an itinerary, streaming days as they are ready
    Plan {
        /// Destination city or region
        #[arg(short, long)]
        destination: String,

        /// First day of the trip
        #[arg(short, long, value_name = "YYYY-MM-DD")]
        start: NaiveDate,

        /// Trip length in days
        #[arg(short = 'n', long, default_value = "3")]
        days: u32,

        /// Total trip budget
        #[arg(short, long)]
        budget: f64,

        /// Number of travelers
        #[arg(short, long, default_value = "1")]
        travelers: u32,

        /// Preference tag (repeatable)
        #[arg(long = "prefer", value_name = "TAG")]
        preferences: Vec<String>,

        /// Trip identifier; derived from destination and start date when omitted
        #[arg(long)]
        trip_id: Option<String>,

        /// Skip the day cache entirely
        #[arg(long)]
        no_cache: bool,

        /// Print raw SSE frames instead of rendered output
        #[arg(long)]
        json: bool,
    },

    /// Follow a remote itinerary event stream
    Follow {
        /// Stream endpoint URL
        url: String,

        /// Print raw SSE frames instead of rendered output
        #[arg(long)]
        json: bool,
    },
}

/// Render one event as it arrives
pub fn render_event(event: &StreamEvent) {
    match event {
        StreamEvent::Meta {
            destination,
            total_days,
            start_date,
            cached,
            resumed_from,
            ..
        } => {
            println!(
                "{} {} day trip to {} starting {}",
                "Planning:".cyan().bold(),
                total_days,
                destination.bold(),
                start_date
            );
            if cached.unwrap_or(false) {
                println!("  {}", "(served from cache)".dimmed());
            } else if let Some(idx) = resumed_from {
                println!("  {}", format!("(resuming from day {})", idx + 1).dimmed());
            }
            println!();
        }
        StreamEvent::Day { day, cached, .. } => {
            render_day(day, cached.unwrap_or(false));
        }
        StreamEvent::Progress { percent, message, .. } => {
            println!("  {} {}", format!("[{percent:>3.0}%]").dimmed(), message.dimmed());
        }
        StreamEvent::Validation {
            iteration,
            status,
            flagged_days,
            ..
        } => {
            let label = match status {
                Verdict::Approved => "APPROVED".green().bold(),
                Verdict::Rejected => "REJECTED".red().bold(),
                Verdict::Warning => "WARNING".yellow().bold(),
            };
            print!("\n{} (pass {iteration}): {label}", "Validation".cyan().bold());
            if flagged_days.is_empty() {
                println!();
            } else {
                let days: Vec<String> = flagged_days.iter().map(|d| (d + 1).to_string()).collect();
                println!(" - reworking day(s) {}", days.join(", "));
            }
        }
        StreamEvent::Refinement {
            budget_issues,
            logistics_issues,
            ..
        } => {
            for issue in budget_issues.iter().chain(logistics_issues) {
                println!("  {} {}", "fix:".yellow(), issue);
            }
        }
        StreamEvent::Error {
            day_index,
            message,
            recoverable,
        } => {
            let prefix = if *recoverable { "warning:".yellow().bold() } else { "error:".red().bold() };
            match day_index {
                Some(idx) => println!("{prefix} day {}: {message}", idx + 1),
                None => println!("{prefix} {message}"),
            }
        }
        // Rendered by the final summary
        StreamEvent::Done { .. } => {}
    }
}

fn render_day(day: &ItineraryDay, cached: bool) {
    let cache_marker = if cached { " (cached)".dimmed().to_string() } else { String::new() };
    println!(
        "{} {} - {}{}",
        format!("Day {}", day.day_number).green().bold(),
        day.date,
        day.title.bold(),
        cache_marker
    );
    for activity in &day.activities {
        println!(
            "  {} {} ({}, ${:.0})",
            activity.time.dimmed(),
            activity.name,
            activity.location.name,
            activity.estimated_cost
        );
    }
    if let Some(foods) = &day.food_recommendations
        && !foods.is_empty()
    {
        println!("  {} {}", "try:".dimmed(), foods.join(", "));
    }
    println!("  {}", format!("day total: ${:.0}", day.total_cost()).dimmed());
    println!();
}

/// Final state after the stream ends
pub fn render_summary(consumer: &StreamConsumer) {
    match consumer.phase() {
        ConsumerPhase::Complete { partial } => {
            let total: f64 = consumer.days().values().map(|d| d.total_cost()).sum();
            let expected = consumer.meta().map_or(consumer.days().len() as u32, |m| m.total_days);
            if *partial {
                println!(
                    "{} connection lost; keeping {} of {} day(s), estimated total ${:.0}",
                    "Partial itinerary:".yellow().bold(),
                    consumer.days().len(),
                    expected,
                    total
                );
            } else {
                println!(
                    "{} {} day(s), estimated total ${:.0}",
                    "Itinerary complete:".green().bold(),
                    consumer.days().len(),
                    total
                );
            }
            if let Some(meta) = consumer.validation_metadata() {
                let budget = if meta.budget_verified { "budget ok".green() } else { "budget unverified".yellow() };
                let logistics = if meta.logistics_verified {
                    "logistics ok".green()
                } else {
                    "logistics unverified".yellow()
                };
                println!(
                    "  {budget}, {logistics}, {} validation pass(es), {} day(s) refined",
                    meta.total_iterations,
                    meta.refined_days.len()
                );
            }
        }
        ConsumerPhase::Error => {
            if let Some(error) = consumer.errors().last() {
                println!("{} {}", "Session failed:".red().bold(), error.message);
                if error.recoverable {
                    println!("  {}", "retry with the same trip id to continue".dimmed());
                }
            } else {
                println!("{}", "Session failed".red().bold());
            }
        }
        _ => {}
    }
}
