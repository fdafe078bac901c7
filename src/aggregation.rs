use std::collections::BTreeSet;

use chrono::{Month, NaiveDate, Weekday};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{FlightError, Result};
use crate::schema::{self, aggregate, flights, weekday};
use crate::selection::FilterSet;
use crate::stats::{self, BoxSummary, ConfidenceInterval};
use crate::table::{FlightView, ValueField, ISO_DATE};

// ── Filtering ───────────────────────────────────────────────────────────────

/// Rows matching the selection, in table order.
///
/// destination ∈ destinations AND (airline ∈ airlines, when any are given)
/// AND (price ≤ max_price, when given). No destinations selects nothing.
pub fn filter(view: &FlightView, selection: &FilterSet) -> Result<FlightView> {
    selection.validate_price()?;

    if selection.destinations.is_empty() {
        debug!("no destinations selected");
        return Ok(FlightView::new(view.frame().clear()));
    }

    let mut predicate = col(flights::DESTINATION).is_in(
        lit(string_series(flights::DESTINATION, &selection.destinations)).implode(),
        false,
    );
    if !selection.airlines.is_empty() {
        predicate = predicate.and(col(flights::AIRLINE).is_in(
            lit(string_series(flights::AIRLINE, &selection.airlines)).implode(),
            false,
        ));
    }
    if let Some(ceiling) = selection.max_price {
        predicate = predicate.and(col(flights::PRICE).lt_eq(lit(ceiling)));
    }

    let df = view.frame().clone().lazy().filter(predicate).collect()?;
    debug!(
        destinations = ?selection.destinations,
        airlines = ?selection.airlines,
        max_price = ?selection.max_price,
        matched = df.height(),
        "filtered flights"
    );
    Ok(FlightView::new(df))
}

fn string_series(name: &str, values: &BTreeSet<String>) -> Series {
    let values: Vec<&str> = values.iter().map(String::as_str).collect();
    Series::new(name.into(), values)
}

/// Steps applied to a subset before grouping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreFilter {
    /// Drop every departure in the given month.
    ExcludeMonth(Month),
}

impl PreFilter {
    pub fn apply(&self, view: &FlightView) -> Result<FlightView> {
        match self {
            Self::ExcludeMonth(month) => {
                let df = view
                    .frame()
                    .clone()
                    .lazy()
                    .filter(col(flights::MO_NAME).neq(lit(schema::month_abbreviation(*month))))
                    .collect()?;
                Ok(FlightView::new(df))
            }
        }
    }
}

// ── Scalars ─────────────────────────────────────────────────────────────────

pub fn summarize_count(view: &FlightView) -> usize {
    view.len()
}

/// Student-t interval for the mean price of the subset.
pub fn confidence_interval(view: &FlightView, level: f64) -> Result<ConfidenceInterval> {
    stats::t_interval(&view.values(ValueField::Price)?, level)
}

// ── Grouped means ───────────────────────────────────────────────────────────

/// Grouping key for `group_mean_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// One group per departure date, ascending by date.
    DepartureDate,
    /// One group per month name, ascending by mean.
    MonthName,
    /// One group per (destination, mo_name, month), ascending by month.
    DestinationMonth,
}

impl GroupKey {
    fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::DepartureDate => &[flights::DEPARTURE_DATE],
            Self::MonthName => &[flights::MO_NAME],
            Self::DestinationMonth => &[flights::DESTINATION, flights::MO_NAME, flights::MONTH],
        }
    }

    fn labels(&self, grouped: &DataFrame) -> Result<Vec<GroupLabel>> {
        let height = grouped.height();
        let mut labels = Vec::with_capacity(height);
        match self {
            Self::DepartureDate => {
                let dates = grouped.column(flights::DEPARTURE_DATE)?.str()?;
                for i in 0..height {
                    let raw = dates.get(i).unwrap_or_default();
                    let date = NaiveDate::parse_from_str(raw, ISO_DATE).map_err(|e| {
                        FlightError::InvalidData(format!("bad departure_date '{raw}': {e}"))
                    })?;
                    labels.push(GroupLabel::Date {
                        departure_date: date,
                    });
                }
            }
            Self::MonthName => {
                let names = grouped.column(flights::MO_NAME)?.str()?;
                for i in 0..height {
                    let mo_name = names.get(i).unwrap_or_default();
                    let month = schema::parse_month_abbreviation(mo_name).ok_or_else(|| {
                        FlightError::InvalidData(format!("unknown mo_name '{mo_name}'"))
                    })?;
                    labels.push(GroupLabel::Month {
                        mo_name: mo_name.to_string(),
                        month: month.number_from_month(),
                    });
                }
            }
            Self::DestinationMonth => {
                let destinations = grouped.column(flights::DESTINATION)?.str()?;
                let names = grouped.column(flights::MO_NAME)?.str()?;
                let months = grouped.column(flights::MONTH)?.i64()?;
                for i in 0..height {
                    labels.push(GroupLabel::DestinationMonth {
                        destination: destinations.get(i).unwrap_or_default().to_string(),
                        mo_name: names.get(i).unwrap_or_default().to_string(),
                        month: months.get(i).unwrap_or_default() as u32,
                    });
                }
            }
        }
        Ok(labels)
    }

    fn order(&self, groups: &mut [GroupMean]) {
        match self {
            Self::DepartureDate => groups.sort_by(|a, b| a.label.sort_key().cmp(&b.label.sort_key())),
            Self::MonthName => groups.sort_by(|a, b| {
                a.mean
                    .total_cmp(&b.mean)
                    .then_with(|| a.label.sort_key().cmp(&b.label.sort_key()))
            }),
            Self::DestinationMonth => {
                groups.sort_by(|a, b| a.label.sort_key().cmp(&b.label.sort_key()))
            }
        }
    }
}

/// Identity of one group in a `group_mean_by` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupLabel {
    Date {
        departure_date: NaiveDate,
    },
    Month {
        mo_name: String,
        month: u32,
    },
    DestinationMonth {
        destination: String,
        mo_name: String,
        month: u32,
    },
}

impl GroupLabel {
    /// Chronological key; destination breaks ties within a month.
    fn sort_key(&self) -> (i32, u32, u32, &str) {
        use chrono::Datelike;
        match self {
            Self::Date { departure_date: d } => (d.year(), d.month(), d.day(), ""),
            Self::Month { month, .. } => (0, *month, 0, ""),
            Self::DestinationMonth {
                destination, month, ..
            } => (0, *month, 0, destination.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    #[serde(flatten)]
    pub label: GroupLabel,
    /// Arithmetic mean, rounded to 2 decimals.
    pub mean: f64,
    /// Number of records in the group.
    pub count: usize,
}

/// Mean of `field` per group.
///
/// Any exclusion (e.g. a partial first month) must be applied by the caller
/// beforehand, see `PreFilter`.
pub fn group_mean_by(view: &FlightView, key: GroupKey, field: ValueField) -> Result<Vec<GroupMean>> {
    if view.is_empty() {
        return Ok(Vec::new());
    }

    let by: Vec<Expr> = key.columns().iter().map(|c| col(*c)).collect();
    let grouped = view
        .frame()
        .clone()
        .lazy()
        .group_by(by)
        .agg([
            col(field.column()).mean().alias(aggregate::MEAN),
            col(field.column())
                .count()
                .cast(DataType::Int64)
                .alias(aggregate::COUNT),
        ])
        .collect()?;

    let labels = key.labels(&grouped)?;
    let means = grouped.column(aggregate::MEAN)?.f64()?;
    let counts = grouped.column(aggregate::COUNT)?.i64()?;

    let mut out: Vec<GroupMean> = labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| GroupMean {
            label,
            mean: stats::round2(means.get(i).unwrap_or(f64::NAN)),
            count: counts.get(i).unwrap_or_default() as usize,
        })
        .collect();
    key.order(&mut out);

    debug!(?key, field = field.column(), groups = out.len(), "grouped means");
    Ok(out)
}

/// First and last entries of a mean-ranked sequence (cheapest, priciest).
pub fn extremes<T>(ranked: &[T]) -> Option<(&T, &T)> {
    ranked.first().zip(ranked.last())
}

// ── Distributions ───────────────────────────────────────────────────────────

/// Raw observations for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayDistribution {
    #[serde(skip)]
    pub weekday: Weekday,
    pub day: &'static str,
    pub values: Vec<f64>,
}

impl DayDistribution {
    pub fn summary(&self) -> Option<BoxSummary> {
        stats::box_summary(&self.values)
    }
}

/// Partition raw `field` values by departure weekday.
///
/// Always seven entries, Monday first; a weekday without observations has
/// an empty sequence. Values keep table order.
pub fn group_distribution_by(view: &FlightView, field: ValueField) -> Result<Vec<DayDistribution>> {
    let mut buckets: [Vec<f64>; 7] = Default::default();

    let days = view.frame().column(flights::DAY_OF_WEEK)?.str()?;
    let values = view.frame().column(field.column())?.f64()?;
    for (day, value) in days.into_iter().zip(values.into_iter()) {
        let (Some(day), Some(value)) = (day, value) else {
            continue;
        };
        let weekday = schema::parse_weekday(day)
            .ok_or_else(|| FlightError::InvalidData(format!("unknown day_of_week '{day}'")))?;
        buckets[weekday.num_days_from_monday() as usize].push(value);
    }

    Ok(weekday::ORDER
        .iter()
        .zip(buckets)
        .map(|(weekday, values)| DayDistribution {
            weekday: *weekday,
            day: schema::weekday_name(*weekday),
            values,
        })
        .collect())
}

// ── Declarative aggregation ─────────────────────────────────────────────────

/// What an `Aggregation` computes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggKind {
    Mean { key: GroupKey, field: ValueField },
    Distribution { field: ValueField },
}

/// Declarative aggregation: kind plus an optional pre-filter.
///
/// Each dashboard view is a list of these run against one filtered subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub(crate) kind: AggKind,
    pub(crate) pre_filter: Option<PreFilter>,
}

impl Aggregation {
    pub fn mean(key: GroupKey, field: ValueField) -> Self {
        Self {
            kind: AggKind::Mean { key, field },
            pre_filter: None,
        }
    }

    pub fn distribution(field: ValueField) -> Self {
        Self {
            kind: AggKind::Distribution { field },
            pre_filter: None,
        }
    }

    pub fn with_pre_filter(mut self, pre_filter: PreFilter) -> Self {
        self.pre_filter = Some(pre_filter);
        self
    }

    pub fn kind(&self) -> AggKind {
        self.kind
    }

    pub fn run(&self, view: &FlightView) -> Result<AggregateOutput> {
        let prepared;
        let view = match &self.pre_filter {
            Some(pre) => {
                prepared = pre.apply(view)?;
                &prepared
            }
            None => view,
        };
        match self.kind {
            AggKind::Mean { key, field } => Ok(AggregateOutput::Means(group_mean_by(view, key, field)?)),
            AggKind::Distribution { field } => Ok(AggregateOutput::Distribution(
                group_distribution_by(view, field)?,
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregateOutput {
    Means(Vec<GroupMean>),
    Distribution(Vec<DayDistribution>),
}

impl AggregateOutput {
    pub fn into_means(self) -> Result<Vec<GroupMean>> {
        match self {
            Self::Means(m) => Ok(m),
            Self::Distribution(_) => Err(FlightError::InvalidArgument(
                "expected grouped means, got a distribution".into(),
            )),
        }
    }

    pub fn into_distribution(self) -> Result<Vec<DayDistribution>> {
        match self {
            Self::Distribution(d) => Ok(d),
            Self::Means(_) => Err(FlightError::InvalidArgument(
                "expected a distribution, got grouped means".into(),
            )),
        }
    }
}

/// Run every aggregation against the same subset, in order.
pub fn apply_aggregations(
    view: &FlightView,
    aggregations: &[Aggregation],
) -> Result<Vec<AggregateOutput>> {
    aggregations.iter().map(|agg| agg.run(view)).collect()
}
