//! Derive control targets for a series from its own history.
use chrono::{DateTime, Utc};
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{zscore, QCTimeSeriesPoint};

/// The fewest prior values a rolling target is computed from
pub const MINIMUM_TARGET_HISTORY: usize = 2;

/// The expected value and spread of a control measurement
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlTarget {
    pub mean: f64,
    pub sd: f64,
}

impl ControlTarget {
    pub fn new(mean: f64, sd: f64) -> Self {
        Self { mean, sd }
    }

    /// The mean and sample standard deviation of `values`, if there are at
    /// least [`MINIMUM_TARGET_HISTORY`] of them
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.len() < MINIMUM_TARGET_HISTORY {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        Some(Self {
            mean,
            sd: (ss / (n - 1.0)).sqrt(),
        })
    }

    pub fn zscore(&self, value: f64) -> f64 {
        zscore(value, self.mean, self.sd)
    }
}

/// Annotate a single analyte's measurements with targets computed from the
/// `window` measurements that preceded each one.
///
/// Measurements are ordered by timestamp first. Until enough history exists,
/// `fallback` is used as the target.
pub fn assign_rolling_targets(
    analyte: &str,
    measurements: &[(DateTime<Utc>, f64)],
    window: usize,
    fallback: ControlTarget,
) -> Vec<QCTimeSeriesPoint> {
    let mut ordered = measurements.to_vec();
    ordered.sort_by_key(|(ts, _)| *ts);
    let values: Vec<f64> = ordered.iter().map(|(_, v)| *v).collect();

    ordered
        .iter()
        .enumerate()
        .map(|(i, (timestamp, value))| {
            let history = &values[i.saturating_sub(window)..i];
            let target = ControlTarget::from_values(history).unwrap_or_else(|| {
                debug!(
                    "{analyte} has {} prior values at {timestamp}, using the fallback target",
                    history.len()
                );
                fallback
            });
            QCTimeSeriesPoint::new(analyte, *timestamp, *value, target.mean, target.sd)
        })
        .collect()
}
