//! Filter selections and their validation against the catalog.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{FlightError, Result};
use crate::table::Catalog;

/// The user's current filter choices.
///
/// An empty `airlines` set means "any airline"; an empty `destinations` set
/// selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSet {
    pub destinations: BTreeSet<String>,
    pub airlines: BTreeSet<String>,
    pub max_price: Option<f64>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destinations<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destinations = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn airlines<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.airlines = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_price(mut self, ceiling: f64) -> Self {
        self.max_price = Some(ceiling);
        self
    }

    /// Reject values the dataset has never seen, so that a typo is not
    /// mistaken for a legitimate zero-match filter.
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if let Some(unknown) = self
            .destinations
            .iter()
            .find(|code| !catalog.has_destination(code))
        {
            return Err(FlightError::InvalidSelection {
                kind: "destination",
                value: unknown.clone(),
            });
        }
        if let Some(unknown) = self.airlines.iter().find(|name| !catalog.has_airline(name)) {
            return Err(FlightError::InvalidSelection {
                kind: "airline",
                value: unknown.clone(),
            });
        }
        self.validate_price()
    }

    /// Only the price ceiling is checked; unknown codes simply match nothing.
    pub fn validate_price(&self) -> Result<()> {
        match self.max_price {
            Some(p) if !p.is_finite() || p < 0.0 => Err(FlightError::InvalidSelection {
                kind: "max_price",
                value: p.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
