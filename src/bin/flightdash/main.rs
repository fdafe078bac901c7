//! flightdash - print dashboard views of the outbound flights dataset.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, data loading, invalid selection)

mod cli;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cli::{Args, Command, OutputFormat};
use flightdash::dashboard::{
    DailyPricesResponse, MonthlyPricesResponse, WeekdayDistributionResponse,
};
use flightdash::{
    Catalog, Config, Dashboard, DashboardSettings, FlightTable, GroupLabel, GroupMean,
};

fn main() {
    let args = Args::parse();
    init_logging(&args);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Initialize logging; `RUST_LOG` wins over the verbosity flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(args: Args) -> Result<()> {
    if let Command::InitConfig { path, force } = &args.command {
        if path.exists() && !*force {
            bail!(
                "{} already exists. Remove it, edit it, or pass --force",
                path.display()
            );
        }
        std::fs::write(path, Config::default_toml())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Created {} with default settings.", path.display());
        return Ok(());
    }

    let mut config =
        Config::discover(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(data) = &args.data {
        config.data.path = data.clone();
    }

    let table = FlightTable::from_csv(&config.data.path, &config.load_options())
        .with_context(|| format!("Failed to load {}", config.data.path.display()))?;
    info!("Loaded {} flights from {}", table.len(), config.data.path.display());

    let settings = DashboardSettings::try_from(&config).context("Invalid configuration")?;
    let dashboard = Dashboard::new(Arc::new(table), settings);

    match args.command {
        Command::Daily(sel) => {
            let destinations = or_default(sel.destinations, || dashboard.default_destinations());
            let response = dashboard.daily_prices(destinations)?;
            emit(args.format, &response, render_daily)
        }
        Command::Monthly(sel) => {
            let destinations = or_default(sel.destinations, || dashboard.default_destinations());
            let response = dashboard.monthly_prices(destinations)?;
            emit(args.format, &response, render_monthly)
        }
        Command::PriceDow(sel) => {
            let (destinations, airlines) = weekday_selection(&dashboard, sel);
            let response = dashboard.price_by_weekday(destinations, airlines)?;
            emit(args.format, &response, render_weekday)
        }
        Command::RatingDow(sel) => {
            let (destinations, airlines) = weekday_selection(&dashboard, sel);
            let response = dashboard.rating_by_weekday(destinations, airlines)?;
            emit(args.format, &response, render_weekday)
        }
        Command::Catalog => emit(args.format, dashboard.table().catalog(), render_catalog),
        Command::InitConfig { .. } => Ok(()),
    }
}

fn or_default(values: Vec<String>, default: impl FnOnce() -> Vec<String>) -> Vec<String> {
    if values.is_empty() {
        default()
    } else {
        values
    }
}

fn weekday_selection(dashboard: &Dashboard, sel: cli::WeekdayArgs) -> (Vec<String>, Vec<String>) {
    let (all_destinations, all_airlines) = dashboard.default_weekday_selection();
    (
        or_default(sel.destinations, || all_destinations),
        or_default(sel.airlines, || all_airlines),
    )
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, render: impl Fn(&T) -> String) -> Result<()> {
    print!("{}", format_output(format, value, render)?);
    Ok(())
}

fn format_output<T: Serialize>(
    format: OutputFormat,
    value: &T,
    render: impl Fn(&T) -> String,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
            Ok(format!("{json}\n"))
        }
        OutputFormat::Text => Ok(render(value)),
    }
}

// ── Text rendering ──────────────────────────────────────────────────────────

/// Join lines, each terminated by a newline.
fn finish(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

fn label(group: &GroupMean) -> String {
    match &group.label {
        GroupLabel::Date { departure_date } => departure_date.to_string(),
        GroupLabel::Month { mo_name, .. } => mo_name.clone(),
        GroupLabel::DestinationMonth {
            destination,
            mo_name,
            ..
        } => format!("{destination} {mo_name}"),
    }
}

fn means_lines(title: &str, groups: &[GroupMean]) -> Vec<String> {
    let mut lines = vec![String::new(), title.to_string()];
    if groups.is_empty() {
        lines.push("  (no flights)".to_string());
    }
    lines.extend(
        groups
            .iter()
            .map(|g| format!("  {:<12} ${:>9.2}  (n = {})", label(g), g.mean, g.count)),
    );
    lines
}

fn render_catalog(catalog: &Catalog) -> String {
    let join = |values: &std::collections::BTreeSet<String>| {
        values.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    finish(vec![
        format!("Destinations: {}", join(catalog.destinations())),
        format!("Airlines: {}", join(catalog.airlines())),
    ])
}

fn render_daily(r: &DailyPricesResponse) -> String {
    let mut lines = vec![
        format!("Destinations: {}", r.destinations.join(", ")),
        r.count_label(),
        r.interval.to_string(),
    ];
    lines.extend(means_lines("Average daily price", &r.daily));
    finish(lines)
}

fn render_monthly(r: &MonthlyPricesResponse) -> String {
    let mut lines = vec![
        format!("Destinations: {}", r.destinations.join(", ")),
        r.count_label(),
        r.interval.to_string(),
    ];
    if let Some(std) = r.price_std {
        lines.push(format!("Standard deviation: ${std:.2}"));
    }
    if let Some(month) = r.excluded_month {
        lines.push(format!("Excluding {month}"));
    }
    lines.extend(means_lines("Average monthly price (cheapest first)", &r.ranked));
    if let (Some(lo), Some(hi)) = (&r.cheapest, &r.priciest) {
        lines.push(format!("  cheapest: {}, priciest: {}", label(lo), label(hi)));
    }
    lines.extend(means_lines("Average price by destination", &r.by_destination));
    finish(lines)
}

fn render_weekday(r: &WeekdayDistributionResponse) -> String {
    let mut lines = vec![
        r.destinations_label(),
        r.airlines_label(),
        format!("Flights priced at or under ${:.0}: {}", r.max_price, r.count),
        String::new(),
    ];
    lines.extend(r.days.iter().map(|day| match day.summary() {
        Some(b) => format!(
            "  {:<10} n={:<4} median {:>7.2}  IQR [{:.2}, {:.2}]  whiskers [{:.2}, {:.2}]  outliers {}",
            day.day,
            day.values.len(),
            b.median,
            b.q1,
            b.q3,
            b.lower_whisker,
            b.upper_whisker,
            b.outliers.len()
        ),
        None => format!("  {:<10} n=0", day.day),
    }));
    finish(lines)
}
