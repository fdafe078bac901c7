//! Shared fixtures for unit tests.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::schema::{self, flights};
use crate::table::{FlightTable, LoadOptions};

pub(crate) struct Row {
    pub date: &'static str,
    pub destination: &'static str,
    pub airline: &'static str,
    pub price: f64,
    pub fly_score: f64,
}

const fn row(
    date: &'static str,
    destination: &'static str,
    airline: &'static str,
    price: f64,
    fly_score: f64,
) -> Row {
    Row {
        date,
        destination,
        airline,
        price,
        fly_score,
    }
}

/// Twelve offers spread over Jan-Apr 2020 and all five destinations.
pub(crate) const SAMPLE: [Row; 12] = [
    row("2020-01-27", "LAX", "JetBlue", 300.0, 7.5),
    row("2020-01-28", "MIA", "American", 150.0, 6.0),
    row("2020-02-03", "LAX", "JetBlue", 250.0, 8.0),
    row("2020-02-03", "LAX", "United", 350.0, 7.0),
    row("2020-02-04", "MIA", "Spirit", 120.0, 5.5),
    row("2020-02-05", "ORD", "American", 200.0, 6.5),
    row("2020-03-06", "LAX", "JetBlue", 600.0, 9.0),
    row("2020-03-07", "ORD", "United", 180.0, 7.0),
    row("2020-03-08", "SJU", "JetBlue", 220.0, 8.5),
    row("2020-04-01", "YUL", "Air Canada", 400.0, 7.5),
    row("2020-04-02", "MIA", "Spirit", 100.0, 4.0),
    row("2020-02-04", "LAX", "JetBlue", 280.0, 8.0),
];

pub(crate) fn frame(rows: &[Row]) -> DataFrame {
    let dates: Vec<NaiveDate> = rows
        .iter()
        .map(|r| NaiveDate::parse_from_str(r.date, "%Y-%m-%d").unwrap())
        .collect();

    df!(
        flights::DEPARTURE_DATE => rows.iter().map(|r| r.date).collect::<Vec<_>>(),
        flights::ARRIVAL_DATE => rows.iter().map(|r| r.date).collect::<Vec<_>>(),
        flights::DEPART_TIME => vec!["08:00:00"; rows.len()],
        flights::ARRIVAL_TIME => vec!["11:30:00"; rows.len()],
        flights::DESTINATION => rows.iter().map(|r| r.destination).collect::<Vec<_>>(),
        flights::AIRLINE => rows.iter().map(|r| r.airline).collect::<Vec<_>>(),
        flights::PRICE => rows.iter().map(|r| r.price).collect::<Vec<_>>(),
        flights::FLY_SCORE => rows.iter().map(|r| r.fly_score).collect::<Vec<_>>(),
        flights::DAY_OF_WEEK => dates
            .iter()
            .map(|d| schema::weekday_name(d.weekday()))
            .collect::<Vec<_>>(),
        flights::MONTH => dates.iter().map(|d| i64::from(d.month())).collect::<Vec<_>>(),
        flights::MO_NAME => dates
            .iter()
            .map(|d| schema::month_abbreviation(schema::month_from_number(d.month()).unwrap()))
            .collect::<Vec<_>>()
    )
    .unwrap()
}

pub(crate) fn sample_frame() -> DataFrame {
    frame(&SAMPLE)
}

pub(crate) fn sample_table() -> FlightTable {
    FlightTable::from_frame(sample_frame(), &LoadOptions::default()).unwrap()
}

pub(crate) fn table_of(rows: &[Row]) -> FlightTable {
    FlightTable::from_frame(frame(rows), &LoadOptions::default()).unwrap()
}
