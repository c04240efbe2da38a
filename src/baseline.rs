//! Estimate the non-peak signal floor of a chromatogram.
//!
//! Three strategies are offered by [`BaselineMethod`]:
//! - [`BaselineMethod::RollingMin`] takes the minimum over a wide centered window
//!   and smooths it with a small Gaussian filter so the floor is not jagged.
//! - [`BaselineMethod::Polynomial`] fits a single cubic to the entire trace. This
//!   only suits simple, smoothly drifting baselines, not crowded chromatograms.
//! - [`BaselineMethod::None`] leaves the signal uncorrected.
use std::fmt;
use std::str::FromStr;

use log::debug;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::minmax;
use crate::smooth::{gaussian_filter, polyfit, rolling_min, PolyfitError};

/// The degree of the polynomial used by [`BaselineMethod::Polynomial`]
pub const POLYNOMIAL_BASELINE_ORDER: usize = 3;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BaselineMethod {
    #[default]
    RollingMin,
    Polynomial,
    None,
}

impl BaselineMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BaselineMethod::RollingMin => "rolling_min",
            BaselineMethod::Polynomial => "polynomial",
            BaselineMethod::None => "none",
        }
    }
}

impl fmt::Display for BaselineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaselineMethod {
    type Err = BaselineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rolling_min" => Ok(BaselineMethod::RollingMin),
            "polynomial" => Ok(BaselineMethod::Polynomial),
            "none" => Ok(BaselineMethod::None),
            _ => Err(BaselineError::UnknownMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BaselineError {
    #[error("Unknown baseline method {0:?}, expected one of rolling_min, polynomial or none")]
    UnknownMethod(String),
    #[error("Failed to fit the baseline polynomial: {0}")]
    FailedToFit(#[from] PolyfitError),
}

/// Parameters controlling baseline estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineEstimator {
    pub method: BaselineMethod,
    /// The width of the rolling minimum window, in samples
    pub window: usize,
    /// The standard deviation of the smoothing kernel, in samples
    pub sigma: f64,
}

impl Default for BaselineEstimator {
    fn default() -> Self {
        Self {
            method: BaselineMethod::RollingMin,
            window: 250,
            sigma: 2.0,
        }
    }
}

impl BaselineEstimator {
    pub fn new(method: BaselineMethod, window: usize, sigma: f64) -> Self {
        Self {
            method,
            window,
            sigma,
        }
    }

    /// Compute a baseline of the same length as `intensity_array`
    pub fn estimate(
        &self,
        time_array: &[f64],
        intensity_array: &[f64],
    ) -> Result<Vec<f64>, BaselineError> {
        match self.method {
            BaselineMethod::RollingMin => {
                let floor = rolling_min(intensity_array, self.window);
                Ok(gaussian_filter(&floor, self.sigma))
            }
            BaselineMethod::Polynomial => polynomial_baseline(time_array, intensity_array),
            BaselineMethod::None => Ok(vec![0.0; intensity_array.len()]),
        }
    }
}

/// Fit a cubic over the whole trace. The time axis is rescaled onto `[-1, 1]`
/// before fitting to keep the system well conditioned.
pub fn polynomial_baseline(
    time_array: &[f64],
    intensity_array: &[f64],
) -> Result<Vec<f64>, BaselineError> {
    let n = intensity_array.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let (tmin, tmax) = minmax(time_array);
    let center = (tmax + tmin) / 2.0;
    let half_span = if tmax > tmin { (tmax - tmin) / 2.0 } else { 1.0 };
    let scaled: Vec<f64> = time_array.iter().map(|t| (t - center) / half_span).collect();

    let order = POLYNOMIAL_BASELINE_ORDER.min(n - 1);
    let poly = polyfit(&scaled, intensity_array, order)?;
    debug!("Fitted baseline polynomial {:?}", poly.as_ref());
    Ok(poly.eval(&scaled))
}

/// Compute a baseline using `method` with the default window parameters
pub fn estimate_baseline(
    time_array: &[f64],
    intensity_array: &[f64],
    method: BaselineMethod,
) -> Result<Vec<f64>, BaselineError> {
    BaselineEstimator {
        method,
        ..Default::default()
    }
    .estimate(time_array, intensity_array)
}

/// Subtract `baseline` from `intensity_array` element-wise
pub fn subtract_baseline(intensity_array: &[f64], baseline: &[f64]) -> Vec<f64> {
    intensity_array
        .iter()
        .zip(baseline.iter())
        .map(|(y, b)| y - b)
        .collect()
}
