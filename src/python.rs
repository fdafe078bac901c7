use std::path::PathBuf;
use std::sync::Arc;

use polars::prelude::*;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3_polars::PyDataFrame;

use crate::aggregation::{DayDistribution, GroupLabel, GroupMean};
use crate::config::Config;
use crate::dashboard::{Dashboard, DashboardSettings, IntervalReport};
use crate::error::FlightError;
use crate::schema::{aggregate, flights};
use crate::table::{FlightTable, ISO_DATE};

/// Python handle on a loaded dashboard.
///
/// The CSV is read once in the constructor; every method recomputes from
/// that table.
#[pyclass(name = "FlightDashboard")]
pub struct PyFlightDashboard {
    inner: Dashboard,
}

#[pymethods]
impl PyFlightDashboard {
    /// Load the dataset.
    ///
    /// Args:
    ///     data_path: flights CSV (default: `[data] path` from the config)
    ///     config_path: TOML config (default: ./flightdash.toml if present)
    #[new]
    #[pyo3(signature = (data_path=None, config_path=None))]
    fn new(data_path: Option<String>, config_path: Option<String>) -> PyResult<Self> {
        let config_path = config_path.map(PathBuf::from);
        let mut config = Config::discover(config_path.as_deref())?;
        if let Some(path) = data_path {
            config.data.path = PathBuf::from(path);
        }
        let table = FlightTable::from_csv(&config.data.path, &config.load_options())?;
        let settings = DashboardSettings::try_from(&config)?;
        Ok(Self {
            inner: Dashboard::new(Arc::new(table), settings),
        })
    }

    // ── Selections ──────────────────────────────────────────────────────────

    /// Known destinations and airlines: {"destinations": [...], "airlines": [...]}.
    fn catalog<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let catalog = self.inner.table().catalog();
        let dict = PyDict::new(py);
        dict.set_item(
            "destinations",
            catalog.destinations().iter().cloned().collect::<Vec<_>>(),
        )?;
        dict.set_item(
            "airlines",
            catalog.airlines().iter().cloned().collect::<Vec<_>>(),
        )?;
        Ok(dict)
    }

    fn default_destinations(&self) -> Vec<String> {
        self.inner.default_destinations()
    }

    // ── Views ───────────────────────────────────────────────────────────────

    /// Daily mean prices for the selected destinations.
    fn daily_prices<'py>(
        &self,
        py: Python<'py>,
        destinations: Vec<String>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let response = self.inner.daily_prices(destinations)?;
        let dict = PyDict::new(py);
        dict.set_item("count", response.count)?;
        dict.set_item("count_label", response.count_label())?;
        set_interval(&dict, &response.interval)?;
        dict.set_item("daily", PyDataFrame(means_frame(&response.daily)?))?;
        Ok(dict)
    }

    /// Monthly mean prices (ranked) and per-destination monthly series.
    fn monthly_prices<'py>(
        &self,
        py: Python<'py>,
        destinations: Vec<String>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let response = self.inner.monthly_prices(destinations)?;
        let dict = PyDict::new(py);
        dict.set_item("count", response.count)?;
        dict.set_item("count_label", response.count_label())?;
        set_interval(&dict, &response.interval)?;
        dict.set_item("price_std", response.price_std)?;
        dict.set_item("ranked", PyDataFrame(means_frame(&response.ranked)?))?;
        dict.set_item("cheapest", response.cheapest.as_ref().and_then(month_name))?;
        dict.set_item("priciest", response.priciest.as_ref().and_then(month_name))?;
        dict.set_item(
            "by_destination",
            PyDataFrame(means_frame(&response.by_destination)?),
        )?;
        Ok(dict)
    }

    /// Raw prices per weekday, under the configured price ceiling.
    fn price_by_weekday<'py>(
        &self,
        py: Python<'py>,
        destinations: Vec<String>,
        airlines: Vec<String>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let response = self.inner.price_by_weekday(destinations, airlines)?;
        weekday_dict(py, &response)
    }

    /// Raw fly scores per weekday, under the configured price ceiling.
    fn rating_by_weekday<'py>(
        &self,
        py: Python<'py>,
        destinations: Vec<String>,
        airlines: Vec<String>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let response = self.inner.rating_by_weekday(destinations, airlines)?;
        weekday_dict(py, &response)
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn flights_df(&self) -> PyDataFrame {
        PyDataFrame(self.inner.table().all().frame().clone())
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

fn set_interval(dict: &Bound<'_, PyDict>, report: &IntervalReport) -> PyResult<()> {
    dict.set_item("interval", report.interval().map(|ci| (ci.lower, ci.upper)))?;
    dict.set_item("interval_label", report.to_string())?;
    Ok(())
}

fn weekday_dict<'py>(
    py: Python<'py>,
    response: &crate::dashboard::WeekdayDistributionResponse,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("destinations_label", response.destinations_label())?;
    dict.set_item("airlines_label", response.airlines_label())?;
    dict.set_item("count", response.count)?;
    dict.set_item("days", days_dict(py, &response.days)?)?;
    Ok(dict)
}

fn days_dict<'py>(py: Python<'py>, days: &[DayDistribution]) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for day in days {
        dict.set_item(day.day, day.values.clone())?;
    }
    Ok(dict)
}

fn month_name(group: &GroupMean) -> Option<String> {
    match &group.label {
        GroupLabel::Month { mo_name, .. } => Some(mo_name.clone()),
        _ => None,
    }
}

/// Flatten grouped means into a frame: key columns, then mean and count.
fn means_frame(groups: &[GroupMean]) -> Result<DataFrame, FlightError> {
    let mut dates = Vec::new();
    let mut destinations = Vec::new();
    let mut mo_names = Vec::new();
    let mut months = Vec::new();
    for group in groups {
        match &group.label {
            GroupLabel::Date { departure_date } => {
                dates.push(departure_date.format(ISO_DATE).to_string())
            }
            GroupLabel::Month { mo_name, month } => {
                mo_names.push(mo_name.clone());
                months.push(i64::from(*month));
            }
            GroupLabel::DestinationMonth {
                destination,
                mo_name,
                month,
            } => {
                destinations.push(destination.clone());
                mo_names.push(mo_name.clone());
                months.push(i64::from(*month));
            }
        }
    }

    let mut columns: Vec<Column> = Vec::new();
    if !dates.is_empty() {
        columns.push(Series::new(flights::DEPARTURE_DATE.into(), dates).into());
    }
    if !destinations.is_empty() {
        columns.push(Series::new(flights::DESTINATION.into(), destinations).into());
    }
    if !mo_names.is_empty() {
        columns.push(Series::new(flights::MO_NAME.into(), mo_names).into());
        columns.push(Series::new(flights::MONTH.into(), months).into());
    }
    let means: Vec<f64> = groups.iter().map(|g| g.mean).collect();
    let counts: Vec<u64> = groups.iter().map(|g| g.count as u64).collect();
    columns.push(Series::new(aggregate::MEAN.into(), means).into());
    columns.push(Series::new(aggregate::COUNT.into(), counts).into());

    Ok(DataFrame::new(columns)?)
}
