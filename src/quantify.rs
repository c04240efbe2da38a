//! Convert peak areas into concentrations using calibration curves, and turn
//! the results into control measurements for [`crate::qc`].
//!
//! A [`CalibrationCurve`] is fit to the responses of a set of standards at known
//! concentrations. Detected peaks are matched to [`CompoundTarget`]s by retention
//! window, where the largest peak inside the window is taken as the compound, and
//! its area is inverted through the compound's curve.
use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, info};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::minmax;
use crate::peak::ChromatographicPeak;
use crate::peak_statistics::aboutzero;
use crate::qc::{ControlTarget, QCTimeSeriesPoint};
use crate::search::find_between;
use crate::smooth::{polyfit, PolyfitError, Polynomial};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("A {model} calibration requires at least {required} levels, received {received}")]
    TooFewLevels {
        model: CalibrationModel,
        required: usize,
        received: usize,
    },
    #[error("The calibration standards all have the same concentration")]
    DegenerateConcentrations,
    #[error("Failed to fit the calibration curve: {0}")]
    FailedToFit(#[from] PolyfitError),
    #[error("The calibration curve has no response to concentration")]
    FlatResponse,
    #[error("A response of {0} cannot be inverted through the calibration curve")]
    ResponseOutOfRange(f64),
}

/// A single calibration standard
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationLevel {
    pub concentration: f64,
    pub response: f64,
}

impl CalibrationLevel {
    pub fn new(concentration: f64, response: f64) -> Self {
        Self {
            concentration,
            response,
        }
    }
}

impl From<(f64, f64)> for CalibrationLevel {
    fn from((concentration, response): (f64, f64)) -> Self {
        Self::new(concentration, response)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CalibrationModel {
    /// `response = slope * concentration + intercept`
    #[default]
    Linear,
    /// `response = slope * concentration`
    LinearThroughOrigin,
    /// `response = a * concentration^2 + b * concentration + c`
    Quadratic,
}

impl CalibrationModel {
    /// The fewest calibration levels the model can be fit to
    pub const fn minimum_levels(&self) -> usize {
        match self {
            CalibrationModel::Linear => 2,
            CalibrationModel::LinearThroughOrigin => 1,
            CalibrationModel::Quadratic => 3,
        }
    }
}

impl fmt::Display for CalibrationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CalibrationModel::Linear => "linear",
            CalibrationModel::LinearThroughOrigin => "linear through origin",
            CalibrationModel::Quadratic => "quadratic",
        };
        f.write_str(name)
    }
}

/// A fitted mapping from concentration to response
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationCurve {
    pub model: CalibrationModel,
    /// Coefficients in ascending order of degree
    pub coefficients: Vec<f64>,
    /// The coefficient of determination of the fit
    pub r_squared: f64,
    /// The range of concentrations spanned by the standards
    pub concentration_range: (f64, f64),
}

impl CalibrationCurve {
    /// Fit `model` to `levels` by least squares
    pub fn fit(
        levels: &[CalibrationLevel],
        model: CalibrationModel,
    ) -> Result<Self, CalibrationError> {
        if levels.len() < model.minimum_levels() {
            return Err(CalibrationError::TooFewLevels {
                model,
                required: model.minimum_levels(),
                received: levels.len(),
            });
        }
        let x: Vec<f64> = levels.iter().map(|l| l.concentration).collect();
        let y: Vec<f64> = levels.iter().map(|l| l.response).collect();
        let (lo, hi) = minmax(&x);
        if model != CalibrationModel::LinearThroughOrigin && lo == hi {
            return Err(CalibrationError::DegenerateConcentrations);
        }

        let coefficients = match model {
            CalibrationModel::LinearThroughOrigin => {
                let sxx: f64 = x.iter().map(|v| v * v).sum();
                if sxx == 0.0 {
                    return Err(CalibrationError::DegenerateConcentrations);
                }
                let sxy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
                vec![0.0, sxy / sxx]
            }
            CalibrationModel::Linear => polyfit(&x, &y, 1)?.as_ref().to_vec(),
            CalibrationModel::Quadratic => polyfit(&x, &y, 2)?.as_ref().to_vec(),
        };

        let mut curve = Self {
            model,
            coefficients,
            r_squared: 0.0,
            concentration_range: (lo, hi),
        };
        curve.r_squared = curve.coefficient_of_determination(&x, &y);
        debug!(
            "Fitted {model} calibration {:?} with r^2 = {:0.5}",
            curve.coefficients, curve.r_squared
        );
        Ok(curve)
    }

    fn polynomial(&self) -> Polynomial<f64> {
        Polynomial::new(self.coefficients.clone())
    }

    fn coefficient_of_determination(&self, x: &[f64], y: &[f64]) -> f64 {
        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
        let ss_res: f64 = x
            .iter()
            .zip(y.iter())
            .map(|(a, b)| (b - self.response_at(*a)).powi(2))
            .sum();
        if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        }
    }

    pub fn slope(&self) -> f64 {
        self.coefficients.get(1).copied().unwrap_or_default()
    }

    pub fn intercept(&self) -> f64 {
        self.coefficients.first().copied().unwrap_or_default()
    }

    /// The predicted response at `concentration`
    pub fn response_at(&self, concentration: f64) -> f64 {
        self.polynomial().evaluate(concentration)
    }

    /// Invert `response` to a concentration.
    ///
    /// For a quadratic curve, the root closest to the calibrated range is chosen.
    pub fn concentration_for(&self, response: f64) -> Result<f64, CalibrationError> {
        let c = self.intercept();
        let b = self.slope();
        let a = self.coefficients.get(2).copied().unwrap_or_default();
        if a == 0.0 {
            if aboutzero(b) {
                return Err(CalibrationError::FlatResponse);
            }
            return Ok((response - c) / b);
        }
        let discriminant = b * b - 4.0 * a * (c - response);
        if discriminant < 0.0 {
            return Err(CalibrationError::ResponseOutOfRange(response));
        }
        // Avoid cancellation when the curvature is negligible
        let q = -0.5 * (b + b.signum() * discriminant.sqrt());
        let candidates = if q == 0.0 {
            vec![-b / (2.0 * a)]
        } else {
            vec![q / a, (c - response) / q]
        };
        let (lo, hi) = self.concentration_range;
        let center = (lo + hi) / 2.0;
        candidates
            .into_iter()
            .min_by(|x, y| (x - center).abs().total_cmp(&(y - center).abs()))
            .ok_or(CalibrationError::ResponseOutOfRange(response))
    }
}

/// A compound to be quantified in a chromatogram
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompoundTarget {
    pub name: String,
    /// The expected retention time
    pub retention_time: f64,
    /// Peaks within this distance of `retention_time` are considered
    pub window: f64,
    pub curve: CalibrationCurve,
}

impl CompoundTarget {
    pub fn new(
        name: impl Into<String>,
        retention_time: f64,
        window: f64,
        curve: CalibrationCurve,
    ) -> Self {
        Self {
            name: name.into(),
            retention_time,
            window,
            curve,
        }
    }
}

/// The amount of a compound found in a chromatogram
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuantitationResult {
    pub compound: String,
    pub retention_time: f64,
    pub area: f64,
    pub concentration: f64,
    /// Whether the concentration lies within the range of the calibration standards
    pub within_calibration: bool,
}

impl QuantitationResult {
    /// Express this result as a control measurement against `target`
    pub fn to_qc_point(&self, timestamp: DateTime<Utc>, target: ControlTarget) -> QCTimeSeriesPoint {
        QCTimeSeriesPoint::new(
            self.compound.clone(),
            timestamp,
            self.concentration,
            target.mean,
            target.sd,
        )
    }
}

/// Match `peaks` to `targets` and invert their areas through each target's curve.
///
/// `peaks` must be sorted by retention time, as produced by peak detection. Targets
/// with no peak in their window, or whose response cannot be inverted, are omitted.
pub fn quantitate(
    peaks: &[ChromatographicPeak],
    targets: &[CompoundTarget],
) -> Vec<QuantitationResult> {
    let retention_times: Vec<f64> = peaks.iter().map(|p| p.retention_time).collect();
    let mut results = Vec::with_capacity(targets.len());
    for target in targets {
        let span = find_between(
            &retention_times,
            target.retention_time - target.window,
            target.retention_time + target.window,
        );
        let Some(peak) = peaks[span].iter().max_by(|a, b| a.area.total_cmp(&b.area)) else {
            debug!(
                "No peak found for {} within {} of {}",
                target.name, target.window, target.retention_time
            );
            continue;
        };
        match target.curve.concentration_for(peak.area) {
            Ok(concentration) => {
                let (lo, hi) = target.curve.concentration_range;
                results.push(QuantitationResult {
                    compound: target.name.clone(),
                    retention_time: peak.retention_time,
                    area: peak.area,
                    concentration,
                    within_calibration: lo <= concentration && concentration <= hi,
                })
            }
            Err(err) => debug!("Failed to quantify {}: {err}", target.name),
        }
    }
    info!(
        "Quantified {} of {} target compounds",
        results.len(),
        targets.len()
    );
    results
}
