//! Scalar statistics over raw observations.

use std::fmt;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

use crate::error::{FlightError, Result};

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Fewest observations a t-interval can be built from (one degree of freedom).
pub const MIN_INTERVAL_OBSERVATIONS: usize = 2;

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Sample standard deviation (n - 1 in the denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev())
}

/// Two-sided Student-t interval for a mean, bounds rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub mean: f64,
    pub level: f64,
    pub n: usize,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.lower, self.upper)
    }
}

/// t-interval for the mean of `values`.
///
/// Uses the sample standard error and n - 1 degrees of freedom. Fewer than
/// two observations is `InsufficientData`; zero variance yields the
/// degenerate interval `(mean, mean)`.
pub fn t_interval(values: &[f64], level: f64) -> Result<ConfidenceInterval> {
    if !(level > 0.0 && level < 1.0) {
        return Err(FlightError::InvalidArgument(format!(
            "confidence level must be within (0, 1), got {level}"
        )));
    }
    let n = values.len();
    if n < MIN_INTERVAL_OBSERVATIONS {
        return Err(FlightError::InsufficientData {
            required: MIN_INTERVAL_OBSERVATIONS,
            found: n,
        });
    }

    let m = mean(values).unwrap_or_default();
    let sd = sample_std(values).unwrap_or_default();
    let sem = sd / (n as f64).sqrt();

    let half_width = if sem > 0.0 {
        let dist = StudentsT::new(0.0, 1.0, (n - 1) as f64)
            .map_err(|e| FlightError::InvalidArgument(e.to_string()))?;
        dist.inverse_cdf((1.0 + level) / 2.0) * sem
    } else {
        0.0
    };

    Ok(ConfidenceInterval {
        lower: round2(m - half_width),
        upper: round2(m + half_width),
        mean: round2(m),
        level,
        n,
    })
}

/// Quartiles, whiskers and outliers of one distribution.
///
/// Quartiles use linear interpolation between order statistics; whiskers
/// reach the most extreme values within 1.5 IQR of the box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile_sorted(&sorted, 0.25);
    let median = quantile_sorted(&sorted, 0.5);
    let q3 = quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside = || sorted.iter().copied().filter(|v| *v >= low_fence && *v <= high_fence);
    let lower_whisker = inside().next().unwrap_or(q1);
    let upper_whisker = inside().last().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(BoxSummary {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

/// Linear interpolation between order statistics, as plotly draws box quartiles.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_000_1), 1.24);
        assert_eq!(round2(-2.5), -2.5);
    }

    #[test]
    fn test_mean_and_sample_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&v).unwrap() - 5.0).abs() < EPS);
        // population sd is 2; sample sd = sqrt(32 / 7)
        assert!((sample_std(&v).unwrap() - (32.0f64 / 7.0).sqrt()).abs() < EPS);
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(sample_std(&[99.0, 99.0, 99.0]), Some(0.0));
    }

    #[test]
    fn test_t_interval_matches_reference_values() {
        // n = 2, mean 150, sd = 70.71, sem = 50, t(0.975, 1) = 12.7062
        let ci = t_interval(&[100.0, 200.0], 0.95).unwrap();
        assert!((ci.lower - (150.0 - 635.31)).abs() < 0.02);
        assert!((ci.upper - (150.0 + 635.31)).abs() < 0.02);

        // n = 5, values 1..=5: mean 3, sem = 0.7071, t(0.975, 4) = 2.7764
        let ci = t_interval(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.95).unwrap();
        assert!((ci.lower - 1.04).abs() < 0.011);
        assert!((ci.upper - 4.96).abs() < 0.011);
        assert_eq!(ci.n, 5);
        assert_eq!(ci.to_string(), format!("({:.2}, {:.2})", ci.lower, ci.upper));
    }

    #[test]
    fn test_t_interval_requires_two_observations() {
        for values in [&[][..], &[42.0][..]] {
            let err = t_interval(values, 0.95).unwrap_err();
            assert!(matches!(
                err,
                FlightError::InsufficientData { required: 2, found } if found == values.len()
            ));
        }
    }

    #[test]
    fn test_t_interval_rejects_bad_level() {
        assert!(matches!(
            t_interval(&[1.0, 2.0], 1.0),
            Err(FlightError::InvalidArgument(_))
        ));
        assert!(t_interval(&[1.0, 2.0], 0.0).is_err());
    }

    #[test]
    fn test_t_interval_zero_variance_is_degenerate() {
        let ci = t_interval(&[99.0, 99.0, 99.0], 0.95).unwrap();
        assert_eq!((ci.lower, ci.upper, ci.mean), (99.0, 99.0, 99.0));
    }

    #[test]
    fn test_t_interval_brackets_mean_and_narrows_with_n() {
        let small: Vec<f64> = [100.0, 200.0].repeat(3);
        let large: Vec<f64> = [100.0, 200.0].repeat(50);
        let a = t_interval(&small, 0.95).unwrap();
        let b = t_interval(&large, 0.95).unwrap();
        for ci in [a, b] {
            assert!(ci.lower <= ci.mean && ci.mean <= ci.upper);
        }
        assert!(b.width() < a.width());

        let wider = t_interval(&large, 0.99).unwrap();
        assert!(wider.width() > b.width());
    }

    #[test]
    fn test_box_summary() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        let b = box_summary(&v).unwrap();
        assert!((b.q1 - 3.0).abs() < EPS);
        assert!((b.median - 5.0).abs() < EPS);
        assert!((b.q3 - 7.0).abs() < EPS);
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 8.0);
        assert_eq!(b.outliers, vec![100.0]);
        assert_eq!(box_summary(&[]), None);

        let single = box_summary(&[4.0]).unwrap();
        assert_eq!((single.q1, single.median, single.q3), (4.0, 4.0, 4.0));
    }
}
