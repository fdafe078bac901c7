//! The four dashboard views, each a filter followed by a list of
//! aggregations over the shared flight table.

use std::fmt;
use std::sync::Arc;

use chrono::Month;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregation::{
    self, extremes, AggregateOutput, Aggregation, DayDistribution, GroupKey, GroupMean, PreFilter,
};
use crate::config::Config;
use crate::error::{FlightError, Result};
use crate::schema;
use crate::selection::FilterSet;
use crate::stats::{self, ConfidenceInterval, DEFAULT_CONFIDENCE_LEVEL};
use crate::table::{FlightTable, FlightView, ValueField};

/// Settings shared by every view.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub confidence_level: f64,
    pub price_ceiling: f64,
    pub excluded_month: Option<Month>,
    pub default_destinations: Vec<String>,
    pub strict_selection: bool,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            price_ceiling: 500.0,
            excluded_month: Some(Month::January),
            default_destinations: vec!["LAX".into(), "MIA".into(), "ORD".into()],
            strict_selection: true,
        }
    }
}

impl TryFrom<&Config> for DashboardSettings {
    type Error = FlightError;

    fn try_from(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            confidence_level: config.stats.confidence_level,
            price_ceiling: config.dashboard.price_ceiling,
            excluded_month: config.dashboard.excluded_month()?,
            default_destinations: config.dashboard.default_destinations.clone(),
            strict_selection: config.dashboard.strict_selection,
        })
    }
}

// ── Responses ───────────────────────────────────────────────────────────────

/// Interval outcome as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntervalReport {
    Interval(ConfidenceInterval),
    NotEnoughData { level: f64, found: usize },
}

impl IntervalReport {
    fn from_view(view: &FlightView, level: f64) -> Result<Self> {
        match aggregation::confidence_interval(view, level) {
            Ok(ci) => Ok(Self::Interval(ci)),
            Err(FlightError::InsufficientData { found, .. }) => {
                warn!(found, "not enough flights for a confidence interval");
                Ok(Self::NotEnoughData { level, found })
            }
            Err(e) => Err(e),
        }
    }

    pub fn interval(&self) -> Option<&ConfidenceInterval> {
        match self {
            Self::Interval(ci) => Some(ci),
            Self::NotEnoughData { .. } => None,
        }
    }
}

impl fmt::Display for IntervalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interval(ci) => {
                write!(f, "{} Confidence Interval: {}", percent(ci.level), ci)
            }
            Self::NotEnoughData { level, found } => write!(
                f,
                "{} Confidence Interval: not enough data (n = {found})",
                percent(*level)
            ),
        }
    }
}

fn percent(level: f64) -> String {
    format!("{}%", stats::round2(level * 100.0))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPricesResponse {
    pub destinations: Vec<String>,
    pub count: usize,
    pub interval: IntervalReport,
    /// Mean price per departure date, ascending by date.
    pub daily: Vec<GroupMean>,
}

impl DailyPricesResponse {
    pub fn count_label(&self) -> String {
        format!("Total Number of Flights: {}", self.count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPricesResponse {
    pub destinations: Vec<String>,
    pub count: usize,
    pub interval: IntervalReport,
    /// Sample standard deviation of price, when n >= 2.
    pub price_std: Option<f64>,
    pub excluded_month: Option<&'static str>,
    /// Mean price per month, ascending by mean.
    pub ranked: Vec<GroupMean>,
    pub cheapest: Option<GroupMean>,
    pub priciest: Option<GroupMean>,
    /// Mean price per destination and month, ascending by month.
    pub by_destination: Vec<GroupMean>,
}

impl MonthlyPricesResponse {
    pub fn count_label(&self) -> String {
        format!("Total Flights Available: {}", self.count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayDistributionResponse {
    pub field: ValueField,
    pub destinations: Vec<String>,
    pub airlines: Vec<String>,
    pub max_price: f64,
    pub count: usize,
    /// Monday through Sunday.
    pub days: Vec<DayDistribution>,
}

impl WeekdayDistributionResponse {
    pub fn destinations_label(&self) -> String {
        format!(
            "The following destinations are selected: {:?}",
            self.destinations
        )
    }

    pub fn airlines_label(&self) -> String {
        format!("The following airlines are selected: {:?}", self.airlines)
    }
}

// ── Dashboard ───────────────────────────────────────────────────────────────

/// Read-only handle on the loaded table plus view settings.
///
/// Cloning is cheap; every call recomputes from the full table.
#[derive(Debug, Clone)]
pub struct Dashboard {
    table: Arc<FlightTable>,
    settings: DashboardSettings,
}

impl Dashboard {
    pub fn new(table: Arc<FlightTable>, settings: DashboardSettings) -> Self {
        Self { table, settings }
    }

    pub fn table(&self) -> &FlightTable {
        &self.table
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Initial selection of the daily and monthly views.
    pub fn default_destinations(&self) -> Vec<String> {
        self.settings.default_destinations.clone()
    }

    /// Initial selection of the weekday views: everything in the catalog.
    pub fn default_weekday_selection(&self) -> (Vec<String>, Vec<String>) {
        let catalog = self.table.catalog();
        (
            catalog.destinations().iter().cloned().collect(),
            catalog.airlines().iter().cloned().collect(),
        )
    }

    /// Validate, filter once, then run each aggregation on the subset.
    pub fn run(
        &self,
        selection: &FilterSet,
        aggregations: &[Aggregation],
    ) -> Result<(FlightView, Vec<AggregateOutput>)> {
        if self.settings.strict_selection {
            selection.validate(self.table.catalog())?;
        }
        let subset = aggregation::filter(self.table.all(), selection)?;
        let outputs = aggregation::apply_aggregations(&subset, aggregations)?;
        debug!(
            matched = subset.len(),
            aggregations = aggregations.len(),
            "dashboard request"
        );
        Ok((subset, outputs))
    }

    pub fn daily_prices<I, S>(&self, destinations: I) -> Result<DailyPricesResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selection = FilterSet::new().destinations(destinations);
        let (subset, outputs) = self.run(
            &selection,
            &[Aggregation::mean(GroupKey::DepartureDate, ValueField::Price)],
        )?;
        let mut outputs = outputs.into_iter();

        Ok(DailyPricesResponse {
            destinations: selection.destinations.iter().cloned().collect(),
            count: aggregation::summarize_count(&subset),
            interval: IntervalReport::from_view(&subset, self.settings.confidence_level)?,
            daily: next_means(&mut outputs)?,
        })
    }

    pub fn monthly_prices<I, S>(&self, destinations: I) -> Result<MonthlyPricesResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selection = FilterSet::new().destinations(destinations);
        let monthly = |key| {
            let agg = Aggregation::mean(key, ValueField::Price);
            match self.settings.excluded_month {
                Some(month) => agg.with_pre_filter(PreFilter::ExcludeMonth(month)),
                None => agg,
            }
        };
        let (subset, outputs) = self.run(
            &selection,
            &[monthly(GroupKey::MonthName), monthly(GroupKey::DestinationMonth)],
        )?;
        let mut outputs = outputs.into_iter();
        let ranked = next_means(&mut outputs)?;
        let by_destination = next_means(&mut outputs)?;
        let (cheapest, priciest) = match extremes(&ranked) {
            Some((lo, hi)) => (Some(lo.clone()), Some(hi.clone())),
            None => (None, None),
        };

        Ok(MonthlyPricesResponse {
            destinations: selection.destinations.iter().cloned().collect(),
            count: aggregation::summarize_count(&subset),
            interval: IntervalReport::from_view(&subset, self.settings.confidence_level)?,
            price_std: stats::sample_std(&subset.values(ValueField::Price)?).map(stats::round2),
            excluded_month: self.settings.excluded_month.map(schema::month_abbreviation),
            ranked,
            cheapest,
            priciest,
            by_destination,
        })
    }

    pub fn price_by_weekday<I, S, J, T>(
        &self,
        destinations: I,
        airlines: J,
    ) -> Result<WeekdayDistributionResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.weekday_distribution(ValueField::Price, destinations, airlines)
    }

    pub fn rating_by_weekday<I, S, J, T>(
        &self,
        destinations: I,
        airlines: J,
    ) -> Result<WeekdayDistributionResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.weekday_distribution(ValueField::FlyScore, destinations, airlines)
    }

    /// Weekday distribution of `field` under the configured price ceiling.
    ///
    /// An empty airline selection means every airline.
    pub fn weekday_distribution<I, S, J, T>(
        &self,
        field: ValueField,
        destinations: I,
        airlines: J,
    ) -> Result<WeekdayDistributionResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let selection = FilterSet::new()
            .destinations(destinations)
            .airlines(airlines)
            .max_price(self.settings.price_ceiling);
        let (subset, outputs) = self.run(&selection, &[Aggregation::distribution(field)])?;
        let days = outputs
            .into_iter()
            .next()
            .ok_or_else(|| FlightError::InvalidArgument("missing distribution output".into()))?
            .into_distribution()?;

        Ok(WeekdayDistributionResponse {
            field,
            destinations: selection.destinations.iter().cloned().collect(),
            airlines: selection.airlines.iter().cloned().collect(),
            max_price: self.settings.price_ceiling,
            count: aggregation::summarize_count(&subset),
            days,
        })
    }
}

fn next_means(outputs: &mut impl Iterator<Item = AggregateOutput>) -> Result<Vec<GroupMean>> {
    outputs
        .next()
        .ok_or_else(|| FlightError::InvalidArgument("missing grouped output".into()))?
        .into_means()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::GroupLabel;
    use crate::test_support::sample_table;

    fn dashboard() -> Dashboard {
        Dashboard::new(Arc::new(sample_table()), DashboardSettings::default())
    }

    #[test]
    fn test_daily_prices() {
        let response = dashboard().daily_prices(["LAX", "MIA", "ORD"]).unwrap();
        assert_eq!(response.count, 10);
        assert_eq!(response.count_label(), "Total Number of Flights: 10");
        assert_eq!(response.daily.len(), 8);

        let ci = response.interval.interval().unwrap();
        assert!(ci.lower <= 253.0 && 253.0 <= ci.upper);
        assert_eq!(ci.mean, 253.0);
        assert!(response.interval.to_string().starts_with("95% Confidence Interval: ("));
    }

    #[test]
    fn test_daily_prices_single_flight_reports_not_enough_data() {
        let response = dashboard().daily_prices(["SJU"]).unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(
            response.interval,
            IntervalReport::NotEnoughData {
                level: 0.95,
                found: 1
            }
        );
        assert_eq!(
            response.interval.to_string(),
            "95% Confidence Interval: not enough data (n = 1)"
        );
    }

    #[test]
    fn test_monthly_prices() {
        let response = dashboard().monthly_prices(["LAX", "MIA", "ORD"]).unwrap();
        assert_eq!(response.count, 10);
        assert_eq!(response.excluded_month, Some("Jan"));
        assert!(response.price_std.is_some());

        let months: Vec<&str> = response
            .ranked
            .iter()
            .map(|g| match &g.label {
                GroupLabel::Month { mo_name, .. } => mo_name.as_str(),
                other => panic!("unexpected label {other:?}"),
            })
            .collect();
        assert_eq!(months, vec!["Apr", "Feb", "Mar"]);
        assert_eq!(response.cheapest.as_ref().map(|g| g.mean), Some(100.0));
        assert_eq!(response.priciest.as_ref().map(|g| g.mean), Some(390.0));
        assert_eq!(response.by_destination.len(), 6);
    }

    #[test]
    fn test_monthly_without_exclusion_keeps_january() {
        let settings = DashboardSettings {
            excluded_month: None,
            ..DashboardSettings::default()
        };
        let dash = Dashboard::new(Arc::new(sample_table()), settings);
        let response = dash.monthly_prices(["LAX"]).unwrap();
        assert!(response
            .ranked
            .iter()
            .any(|g| matches!(&g.label, GroupLabel::Month { mo_name, .. } if mo_name == "Jan")));
    }

    #[test]
    fn test_price_by_weekday_scenario() {
        let response = dashboard()
            .price_by_weekday(["LAX"], ["JetBlue"])
            .unwrap();
        assert_eq!(response.count, 3);
        assert_eq!(response.max_price, 500.0);
        assert_eq!(
            response.destinations_label(),
            "The following destinations are selected: [\"LAX\"]"
        );
        assert_eq!(
            response.airlines_label(),
            "The following airlines are selected: [\"JetBlue\"]"
        );
        assert_eq!(response.days[0].values, vec![300.0, 250.0]);
        assert_eq!(response.days[1].values, vec![280.0]);
    }

    #[test]
    fn test_rating_by_weekday_uses_fly_score() {
        let dash = dashboard();
        let (destinations, airlines) = dash.default_weekday_selection();
        let response = dash.rating_by_weekday(destinations, airlines).unwrap();
        assert_eq!(response.field, ValueField::FlyScore);
        assert_eq!(response.count, 11);
        assert_eq!(response.days[0].values, vec![7.5, 8.0, 7.0]);
        assert!(response
            .days
            .iter()
            .flat_map(|d| d.values.iter())
            .all(|v| (0.0..=10.0).contains(v)));
    }

    #[test]
    fn test_strict_selection_rejects_unknown_codes() {
        let err = dashboard().daily_prices(["ZZZ"]).unwrap_err();
        assert!(matches!(err, FlightError::InvalidSelection { kind: "destination", .. }));
    }

    #[test]
    fn test_lenient_selection_treats_unknown_codes_as_empty() {
        let settings = DashboardSettings {
            strict_selection: false,
            ..DashboardSettings::default()
        };
        let dash = Dashboard::new(Arc::new(sample_table()), settings);
        let response = dash.daily_prices(["ZZZ"]).unwrap();
        assert_eq!(response.count, 0);
        assert!(response.daily.is_empty());
        assert!(matches!(
            response.interval,
            IntervalReport::NotEnoughData { found: 0, .. }
        ));
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.dashboard.price_ceiling = 250.0;
        config.dashboard.excluded_month = Some("Mar".into());
        let settings = DashboardSettings::try_from(&config).unwrap();
        assert_eq!(settings.price_ceiling, 250.0);
        assert_eq!(settings.excluded_month, Some(Month::March));
    }

    #[test]
    fn test_responses_serialize_to_json() {
        let response = dashboard().monthly_prices(["LAX", "ORD"]).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["count"], 7);
        assert_eq!(json["interval"]["status"], "interval");
        assert!(json["ranked"][0]["mo_name"].is_string());
        assert!(json["by_destination"][0]["destination"].is_string());

        let daily = serde_json::to_value(dashboard().daily_prices(["SJU"]).unwrap()).unwrap();
        assert_eq!(daily["interval"]["status"], "not_enough_data");
        assert_eq!(daily["daily"][0]["departure_date"], "2020-03-08");
    }
}
