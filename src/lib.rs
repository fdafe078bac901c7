//! Filter a table of outbound flight offers and turn the selection into
//! dashboard-ready statistics: counts, price confidence intervals, grouped
//! means and per-weekday distributions.

pub mod aggregation;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod schema;
pub mod selection;
pub mod stats;
pub mod table;

#[cfg(feature = "python")]
mod python;
#[cfg(test)]
mod test_support;

pub use aggregation::{
    confidence_interval, extremes, filter, group_distribution_by, group_mean_by,
    summarize_count, Aggregation, GroupKey, GroupLabel, GroupMean, PreFilter,
};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardSettings, IntervalReport};
pub use error::{FlightError, Result};
pub use selection::FilterSet;
pub use table::{Catalog, FlightRecord, FlightTable, FlightView, LoadOptions, ValueField};

#[cfg(feature = "python")]
mod py_module {
    use pyo3::prelude::*;
    use pyo3::types::PyModule;

    use crate::python::PyFlightDashboard;
    use crate::schema;

    /// Export schema constants as Python submodules
    fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Flight columns
        let flights = PyModule::new(m.py(), "flights")?;
        flights.add("DEPARTURE_DATE", schema::flights::DEPARTURE_DATE)?;
        flights.add("ARRIVAL_DATE", schema::flights::ARRIVAL_DATE)?;
        flights.add("DEPART_TIME", schema::flights::DEPART_TIME)?;
        flights.add("ARRIVAL_TIME", schema::flights::ARRIVAL_TIME)?;
        flights.add("DESTINATION", schema::flights::DESTINATION)?;
        flights.add("AIRLINE", schema::flights::AIRLINE)?;
        flights.add("PRICE", schema::flights::PRICE)?;
        flights.add("FLY_SCORE", schema::flights::FLY_SCORE)?;
        flights.add("DAY_OF_WEEK", schema::flights::DAY_OF_WEEK)?;
        flights.add("MONTH", schema::flights::MONTH)?;
        flights.add("MO_NAME", schema::flights::MO_NAME)?;
        m.add_submodule(&flights)?;

        // Aggregate outputs
        let aggregate = PyModule::new(m.py(), "aggregate")?;
        aggregate.add("MEAN", schema::aggregate::MEAN)?;
        aggregate.add("COUNT", schema::aggregate::COUNT)?;
        m.add_submodule(&aggregate)?;

        // Weekday display order
        let weekday = PyModule::new(m.py(), "weekday")?;
        weekday.add("NAMES", schema::weekday::NAMES.to_vec())?;
        m.add_submodule(&weekday)?;

        Ok(())
    }

    #[pymodule]
    #[pyo3(name = "_core")]
    fn flightdash(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_class::<PyFlightDashboard>()?;
        add_schema_exports(m)?;
        Ok(())
    }
}
