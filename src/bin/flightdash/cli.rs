//! Command-line interface argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

/// flightdash - explore outbound flight prices from the command line
///
/// Loads the flights CSV once and prints one dashboard view.
///
/// Examples:
///   flightdash daily -d LAX,MIA,ORD
///   flightdash monthly -d LAX --format json
///   flightdash price-dow -d LAX -a JetBlue
///   flightdash rating-dow
///   flightdash init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for flightdash.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "FLIGHTDASH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Flights CSV, overriding `[data] path` from the config
    #[arg(long, value_name = "FILE", env = "FLIGHTDASH_DATA", global = true)]
    pub data: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text", value_name = "FORMAT", global = true)]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Daily mean prices with count and confidence interval
    Daily(DestinationArgs),

    /// Monthly mean prices, ranked, plus per-destination series
    Monthly(DestinationArgs),

    /// Price distribution by day of the week
    PriceDow(WeekdayArgs),

    /// Fly-score distribution by day of the week
    RatingDow(WeekdayArgs),

    /// List known destinations and airlines
    Catalog,

    /// Write a default flightdash.toml
    InitConfig {
        /// Where to write the file
        #[arg(default_value = "flightdash.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct DestinationArgs {
    /// Destination airport codes (repeatable or comma-separated)
    ///
    /// Defaults to `[dashboard] default_destinations`
    #[arg(
        short,
        long = "destination",
        value_name = "CODE",
        value_delimiter = ',',
        value_parser = trimmed
    )]
    pub destinations: Vec<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct WeekdayArgs {
    /// Destination airport codes (default: all)
    #[arg(
        short,
        long = "destination",
        value_name = "CODE",
        value_delimiter = ',',
        value_parser = trimmed
    )]
    pub destinations: Vec<String>,

    /// Airline names (default: all)
    #[arg(
        short,
        long = "airline",
        value_name = "NAME",
        value_delimiter = ',',
        value_parser = trimmed
    )]
    pub airlines: Vec<String>,
}

/// Strip whitespace around each comma-separated value.
fn trimmed(raw: &str) -> Result<String, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("value must not be empty".to_string());
    }
    Ok(value.to_string())
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON document
    Json,
}

impl Args {
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}
