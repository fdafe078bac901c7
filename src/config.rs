//! Configuration file handling.
//!
//! Settings are read from `flightdash.toml`; every field has a default so an
//! empty or partial file is valid.

use std::path::{Path, PathBuf};

use chrono::Month;
use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};
use crate::schema;
use crate::stats::DEFAULT_CONFIDENCE_LEVEL;
use crate::table::{LoadOptions, ISO_DATE};

pub const DEFAULT_CONFIG_FILE: &str = "flightdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dataset location and format.
    #[serde(default)]
    pub data: DataConfig,

    /// Statistics settings.
    #[serde(default)]
    pub stats: StatsConfig,

    /// Per-view dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path of the flights CSV.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    /// chrono format of the date columns.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            date_format: default_date_format(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("assets/flights_departing_nyc.csv")
}

fn default_date_format() -> String {
    ISO_DATE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Confidence level of the price interval.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            confidence_level: default_confidence_level(),
        }
    }
}

fn default_confidence_level() -> f64 {
    DEFAULT_CONFIDENCE_LEVEL
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Price ceiling of both day-of-week views.
    #[serde(default = "default_price_ceiling")]
    pub price_ceiling: f64,

    /// Month left out of monthly aggregations (first, partial month of the scrape).
    /// An empty string keeps every month.
    #[serde(default = "default_excluded_month")]
    pub excluded_month: Option<String>,

    /// Initial selection of the daily and monthly views.
    #[serde(default = "default_destinations")]
    pub default_destinations: Vec<String>,

    /// Reject selections that are not in the dataset.
    #[serde(default = "default_strict_selection")]
    pub strict_selection: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            price_ceiling: default_price_ceiling(),
            excluded_month: default_excluded_month(),
            default_destinations: default_destinations(),
            strict_selection: default_strict_selection(),
        }
    }
}

fn default_price_ceiling() -> f64 {
    500.0
}

fn default_excluded_month() -> Option<String> {
    Some("Jan".to_string())
}

fn default_destinations() -> Vec<String> {
    vec!["LAX", "MIA", "ORD"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_strict_selection() -> bool {
    true
}

impl DashboardConfig {
    /// Parsed `excluded_month`.
    pub fn excluded_month(&self) -> Result<Option<Month>> {
        match &self.excluded_month {
            None => Ok(None),
            Some(name) if name.trim().is_empty() => Ok(None),
            Some(name) => schema::parse_month_abbreviation(name)
                .map(Some)
                .ok_or_else(|| FlightError::Config(format!("unknown excluded_month '{name}'"))),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `flightdash.toml` in the working directory
    /// when present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let level = self.stats.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(FlightError::Config(format!(
                "confidence_level must be within (0, 1), got {level}"
            )));
        }
        let ceiling = self.dashboard.price_ceiling;
        if !ceiling.is_finite() || ceiling < 0.0 {
            return Err(FlightError::Config(format!(
                "price_ceiling must be a non-negative number, got {ceiling}"
            )));
        }
        self.dashboard.excluded_month()?;
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            date_format: self.data.date_format.clone(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
