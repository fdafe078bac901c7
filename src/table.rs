//! The flight table: loaded once, validated, then shared read-only.
//!
//! `FlightTable` owns the full dataset and the `Catalog` of known
//! destinations and airlines. Every aggregation works on a `FlightView`,
//! which is either the whole table or a filtered subset of it.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Datelike, Month, NaiveDate, TimeDelta, Weekday};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{FlightError, Result};
use crate::schema::{self, flights};

/// Dates are rewritten to this format on load, whatever the source format was.
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Options for turning a raw frame into a `FlightTable`.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// chrono format of `departure_date` / `arrival_date` in the source.
    pub date_format: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            date_format: ISO_DATE.to_string(),
        }
    }
}

/// Numeric column an aggregation reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    Price,
    FlyScore,
}

impl ValueField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Price => flights::PRICE,
            Self::FlyScore => flights::FLY_SCORE,
        }
    }
}

/// One observed flight offer.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRecord {
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub depart_time: TimeDelta,
    pub arrival_time: TimeDelta,
    pub destination: String,
    pub airline: String,
    pub price: f64,
    pub fly_score: f64,
    pub day_of_week: Weekday,
    pub month: Month,
}

impl FlightRecord {
    /// `mo_name` is derived from the departure month.
    pub fn mo_name(&self) -> &'static str {
        schema::month_abbreviation(self.month)
    }
}

/// Closed sets of destination codes and airline names present in the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    destinations: BTreeSet<String>,
    airlines: BTreeSet<String>,
}

impl Catalog {
    pub fn new<D, A>(destinations: D, airlines: A) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            destinations: destinations.into_iter().map(Into::into).collect(),
            airlines: airlines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn destinations(&self) -> &BTreeSet<String> {
        &self.destinations
    }

    pub fn airlines(&self) -> &BTreeSet<String> {
        &self.airlines
    }

    pub fn has_destination(&self, code: &str) -> bool {
        self.destinations.contains(code)
    }

    pub fn has_airline(&self, name: &str) -> bool {
        self.airlines.contains(name)
    }

    fn from_frame(df: &DataFrame) -> Result<Self> {
        let distinct = |name: &str| -> Result<BTreeSet<String>> {
            Ok(df
                .column(name)?
                .str()?
                .into_iter()
                .filter_map(|v| v.map(|s| s.to_string()))
                .collect())
        };
        Ok(Self {
            destinations: distinct(flights::DESTINATION)?,
            airlines: distinct(flights::AIRLINE)?,
        })
    }
}

/// A set of flight rows sharing the table schema.
///
/// Views are produced by `FlightTable::all` or by filtering; they never
/// alias mutable state, so a view may be kept across requests.
#[derive(Debug, Clone)]
pub struct FlightView {
    df: DataFrame,
}

impl FlightView {
    pub(crate) fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Raw values of a numeric field, in row order.
    pub fn values(&self, field: ValueField) -> Result<Vec<f64>> {
        Ok(self
            .df
            .column(field.column())?
            .f64()?
            .into_iter()
            .flatten()
            .collect())
    }

    /// Materialise typed records, in row order.
    pub fn records(&self) -> Result<Vec<FlightRecord>> {
        let df = &self.df;
        let departure = df.column(flights::DEPARTURE_DATE)?.str()?;
        let arrival = df.column(flights::ARRIVAL_DATE)?.str()?;
        let depart_time = df.column(flights::DEPART_TIME)?.str()?;
        let arrival_time = df.column(flights::ARRIVAL_TIME)?.str()?;
        let destination = df.column(flights::DESTINATION)?.str()?;
        let airline = df.column(flights::AIRLINE)?.str()?;
        let price = df.column(flights::PRICE)?.f64()?;
        let fly_score = df.column(flights::FLY_SCORE)?.f64()?;

        let mut out = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let departure_date = parse_date(cell(departure, i, flights::DEPARTURE_DATE)?, ISO_DATE, i)?;
            let month = schema::month_from_number(departure_date.month()).ok_or_else(|| {
                FlightError::InvalidData(format!("Row {i}: departure month out of range"))
            })?;
            out.push(FlightRecord {
                departure_date,
                arrival_date: parse_date(cell(arrival, i, flights::ARRIVAL_DATE)?, ISO_DATE, i)?,
                depart_time: parse_time_cell(cell(depart_time, i, flights::DEPART_TIME)?, i)?,
                arrival_time: parse_time_cell(cell(arrival_time, i, flights::ARRIVAL_TIME)?, i)?,
                destination: cell(destination, i, flights::DESTINATION)?.to_string(),
                airline: cell(airline, i, flights::AIRLINE)?.to_string(),
                price: price.get(i).unwrap_or(f64::NAN),
                fly_score: fly_score.get(i).unwrap_or(f64::NAN),
                day_of_week: departure_date.weekday(),
                month,
            });
        }
        Ok(out)
    }
}

/// The full, immutable flight dataset.
#[derive(Debug, Clone)]
pub struct FlightTable {
    all: FlightView,
    catalog: Catalog,
}

impl FlightTable {
    /// Load the flights CSV.
    ///
    /// Required columns are listed in `schema::flights::REQUIRED`; any
    /// other columns are kept and ignored. Column names are trimmed.
    pub fn from_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FlightError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("flight data not found: {}", path.display()),
            )));
        }
        let raw = read_csv_as_strings(path)?;
        debug!(path = %path.display(), rows = raw.height(), "read flights csv");
        Self::from_frame(raw, options)
    }

    /// Build a table from an already-loaded frame.
    ///
    /// Numeric columns may arrive as strings (straight from CSV) or already
    /// typed; both are normalised to Float64 / Int64.
    pub fn from_frame(raw: DataFrame, options: &LoadOptions) -> Result<Self> {
        require_columns(&raw, &flights::REQUIRED)?;

        let df = raw
            .clone()
            .lazy()
            .with_columns([
                numeric_expr(&raw, flights::PRICE, DataType::Float64)?,
                numeric_expr(&raw, flights::FLY_SCORE, DataType::Float64)?,
                numeric_expr(&raw, flights::MONTH, DataType::Int64)?,
                trimmed(flights::DESTINATION),
                trimmed(flights::AIRLINE),
                trimmed(flights::DAY_OF_WEEK),
                trimmed(flights::MO_NAME),
            ])
            .collect()?;

        for name in [flights::PRICE, flights::FLY_SCORE, flights::MONTH] {
            let null_count = df.column(name)?.null_count();
            if null_count > 0 {
                return Err(FlightError::InvalidData(format!(
                    "Column '{}' has {} missing or non-numeric values",
                    name, null_count
                )));
            }
        }

        let df = validate_rows(df, &options.date_format)?;
        let catalog = Catalog::from_frame(&df)?;

        info!(
            rows = df.height(),
            destinations = catalog.destinations.len(),
            airlines = catalog.airlines.len(),
            "flight table loaded"
        );

        Ok(Self {
            all: FlightView::new(df),
            catalog,
        })
    }

    /// Every record in the table.
    pub fn all(&self) -> &FlightView {
        &self.all
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

/// Read a CSV file with all columns as String dtype and trimmed names.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;
    Ok(df)
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(FlightError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

fn numeric_expr(df: &DataFrame, name: &str, dtype: DataType) -> Result<Expr> {
    let expr = if df.column(name)?.dtype() == &DataType::String {
        col(name).str().strip_chars(lit(" \t\r\n")).cast(dtype)
    } else {
        col(name).cast(dtype)
    };
    Ok(expr)
}

fn trimmed(name: &str) -> Expr {
    col(name).str().strip_chars(lit(" \t\r\n"))
}

/// Check value ranges and the derived-column invariant, and rewrite both
/// date columns to `ISO_DATE`.
fn validate_rows(mut df: DataFrame, date_format: &str) -> Result<DataFrame> {
    let height = df.height();
    let mut departures = Vec::with_capacity(height);
    let mut arrivals = Vec::with_capacity(height);
    {
        let departure = df.column(flights::DEPARTURE_DATE)?.str()?;
        let arrival = df.column(flights::ARRIVAL_DATE)?.str()?;
        let depart_time = df.column(flights::DEPART_TIME)?.str()?;
        let arrival_time = df.column(flights::ARRIVAL_TIME)?.str()?;
        let day_of_week = df.column(flights::DAY_OF_WEEK)?.str()?;
        let mo_name = df.column(flights::MO_NAME)?.str()?;
        let month = df.column(flights::MONTH)?.i64()?;
        let price = df.column(flights::PRICE)?.f64()?;
        let fly_score = df.column(flights::FLY_SCORE)?.f64()?;

        for i in 0..height {
            let date = parse_date(cell(departure, i, flights::DEPARTURE_DATE)?, date_format, i)?;
            let arrives = parse_date(cell(arrival, i, flights::ARRIVAL_DATE)?, date_format, i)?;
            parse_time_cell(cell(depart_time, i, flights::DEPART_TIME)?, i)?;
            parse_time_cell(cell(arrival_time, i, flights::ARRIVAL_TIME)?, i)?;

            let p = price.get(i).unwrap_or(f64::NAN);
            if !(p >= 0.0) {
                return Err(FlightError::InvalidData(format!(
                    "Row {i}: price must be non-negative, got {p}"
                )));
            }
            let score = fly_score.get(i).unwrap_or(f64::NAN);
            if !(schema::fly_score::MIN..=schema::fly_score::MAX).contains(&score) {
                return Err(FlightError::InvalidData(format!(
                    "Row {i}: fly_score must be within 0-10, got {score}"
                )));
            }

            let dow = cell(day_of_week, i, flights::DAY_OF_WEEK)?;
            if schema::parse_weekday(dow) != Some(date.weekday()) {
                return Err(FlightError::InvalidData(format!(
                    "Row {i}: day_of_week '{dow}' does not match departure_date {date} ({})",
                    schema::weekday_name(date.weekday())
                )));
            }
            let m = month.get(i).unwrap_or_default();
            if m != i64::from(date.month()) {
                return Err(FlightError::InvalidData(format!(
                    "Row {i}: month {m} does not match departure_date {date}"
                )));
            }
            let name = cell(mo_name, i, flights::MO_NAME)?;
            if schema::parse_month_abbreviation(name) != schema::month_from_number(date.month()) {
                return Err(FlightError::InvalidData(format!(
                    "Row {i}: mo_name '{name}' does not match departure_date {date}"
                )));
            }

            departures.push(date.format(ISO_DATE).to_string());
            arrivals.push(arrives.format(ISO_DATE).to_string());
        }
    }

    df.with_column(Series::new(flights::DEPARTURE_DATE.into(), departures))?;
    df.with_column(Series::new(flights::ARRIVAL_DATE.into(), arrivals))?;
    Ok(df)
}

fn cell<'a>(column: &'a StringChunked, row: usize, name: &str) -> Result<&'a str> {
    column
        .get(row)
        .ok_or_else(|| FlightError::InvalidData(format!("Row {row}: '{name}' is empty")))
}

fn parse_date(raw: &str, format: &str, row: usize) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format).map_err(|e| {
        FlightError::InvalidData(format!(
            "Row {row}: cannot parse date '{raw}' with format '{format}': {e}"
        ))
    })
}

fn parse_time_cell(raw: &str, row: usize) -> Result<TimeDelta> {
    parse_time_of_day(raw)
        .ok_or_else(|| FlightError::InvalidData(format!("Row {row}: cannot parse time '{raw}'")))
}

/// Parse `HH:MM[:SS[.fff]]`, optionally prefixed with `N days `.
pub fn parse_time_of_day(raw: &str) -> Option<TimeDelta> {
    let raw = raw.trim();
    let (days, clock) = match raw.split_once(" days ").or_else(|| raw.split_once(" day ")) {
        Some((d, rest)) => (d.trim().parse::<i64>().ok()?, rest.trim()),
        None => (0, raw),
    };

    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.trim().parse().ok()?;
    let minutes: i64 = parts.next()?.trim().parse().ok()?;
    let seconds: f64 = match parts.next() {
        Some(s) => s.trim().parse().ok()?,
        None => 0.0,
    };
    if parts.next().is_some()
        || days < 0
        || hours < 0
        || !(0..60).contains(&minutes)
        || !(0.0..60.0).contains(&seconds)
    {
        return None;
    }

    let millis = (seconds * 1000.0).round() as i64;
    TimeDelta::try_days(days)?
        .checked_add(&TimeDelta::try_hours(hours)?)?
        .checked_add(&TimeDelta::try_minutes(minutes)?)?
        .checked_add(&TimeDelta::try_milliseconds(millis)?)
}
