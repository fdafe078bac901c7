//! Column-name constants and category vocabularies for the flight table.
//! Single source of truth - exported to Python via PyO3.

use chrono::{Month, Weekday};

// ── Flight columns ──────────────────────────────────────────────────────────
pub mod flights {
    pub const DEPARTURE_DATE: &str = "departure_date";
    pub const ARRIVAL_DATE: &str = "arrival_date";
    pub const DEPART_TIME: &str = "depart_time";
    pub const ARRIVAL_TIME: &str = "arrival_time";
    pub const DESTINATION: &str = "destination";
    pub const AIRLINE: &str = "airline";
    pub const PRICE: &str = "price";
    pub const FLY_SCORE: &str = "fly_score";
    pub const DAY_OF_WEEK: &str = "day_of_week";
    pub const MONTH: &str = "month";
    pub const MO_NAME: &str = "mo_name";

    pub const REQUIRED: [&str; 11] = [
        DEPARTURE_DATE,
        ARRIVAL_DATE,
        DEPART_TIME,
        ARRIVAL_TIME,
        DESTINATION,
        AIRLINE,
        PRICE,
        FLY_SCORE,
        DAY_OF_WEEK,
        MONTH,
        MO_NAME,
    ];
}

// ── Aggregate output columns ────────────────────────────────────────────────
pub mod aggregate {
    pub const MEAN: &str = "mean";
    pub const COUNT: &str = "count";
}

// ── Rating bounds ───────────────────────────────────────────────────────────
pub mod fly_score {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 10.0;
}

// ── Weekday vocabulary ──────────────────────────────────────────────────────
pub mod weekday {
    use chrono::Weekday;

    /// Display order used by every day-of-week view.
    pub const ORDER: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub const NAMES: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
}

// ── Month vocabulary ────────────────────────────────────────────────────────
pub mod month {
    pub const ABBREVIATIONS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
}

/// Full English weekday name as stored in `day_of_week`.
pub fn weekday_name(day: Weekday) -> &'static str {
    weekday::NAMES[day.num_days_from_monday() as usize]
}

/// Parse a `day_of_week` cell. Only full English names are accepted.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    let name = name.trim();
    weekday::NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(name))
        .map(|i| weekday::ORDER[i])
}

/// Three-letter month abbreviation as stored in `mo_name`.
pub fn month_abbreviation(month: Month) -> &'static str {
    month::ABBREVIATIONS[month.number_from_month() as usize - 1]
}

/// Parse a `mo_name` cell (three-letter abbreviation, case-insensitive).
pub fn parse_month_abbreviation(name: &str) -> Option<Month> {
    let name = name.trim();
    month::ABBREVIATIONS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .and_then(|i| month_from_number(i as u32 + 1))
}

pub fn month_from_number(number: u32) -> Option<Month> {
    u8::try_from(number).ok().and_then(|n| Month::try_from(n).ok())
}
