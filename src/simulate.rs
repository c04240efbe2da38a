//! Synthesize chromatograms from a list of compounds, for tests and demonstrations.
//!
//! Each compound contributes a Gaussian whose standard deviation is derived from
//! its full width at half maximum. Optional white noise and a linear drift can be
//! layered underneath. Passing a seed makes the output reproducible.
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::{gridspace, ChromatogramArrays};

/// The ratio between the full width at half maximum of a Gaussian and its standard deviation
pub const FWHM_TO_SIGMA: f64 = 2.354_820_045_030_949;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("The time grid from {start} to {end} with step {step} is empty")]
    EmptyTimeGrid { start: f64, end: f64, step: f64 },
    #[error("Compound {name:?} has a non-positive width {fwhm}")]
    InvalidWidth { name: String, fwhm: f64 },
    #[error("The noise level must not be negative, received {0}")]
    InvalidNoiseLevel(f64),
}

/// A compound eluting as a single Gaussian peak
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulatedCompound {
    pub name: String,
    /// The time of the apex
    pub retention_time: f64,
    /// The height of the apex
    pub intensity: f64,
    /// The full width at half maximum
    pub fwhm: f64,
}

impl SimulatedCompound {
    pub fn new(name: impl Into<String>, retention_time: f64, intensity: f64, fwhm: f64) -> Self {
        Self {
            name: name.into(),
            retention_time,
            intensity,
            fwhm,
        }
    }

    pub fn sigma(&self) -> f64 {
        self.fwhm / FWHM_TO_SIGMA
    }

    /// The noise-free signal this compound contributes at `time`
    #[inline]
    pub fn signal_at(&self, time: f64) -> f64 {
        let z = (time - self.retention_time) / self.sigma();
        self.intensity * (-0.5 * z * z).exp()
    }

    /// The exact integral of this compound's Gaussian between `start` and `end`
    pub fn expected_area(&self, start: f64, end: f64) -> f64 {
        let sigma = self.sigma();
        let scale = sigma * std::f64::consts::SQRT_2;
        let lower = libm::erf((start - self.retention_time) / scale);
        let upper = libm::erf((end - self.retention_time) / scale);
        self.intensity * sigma * (std::f64::consts::PI / 2.0).sqrt() * (upper - lower)
    }

    /// The integral of this compound's Gaussian over the whole real line
    pub fn total_area(&self) -> f64 {
        self.intensity * self.sigma() * (2.0 * std::f64::consts::PI).sqrt()
    }
}

/// Configurable chromatogram generator
#[derive(Debug, Clone, PartialEq)]
pub struct ChromatogramSimulator {
    pub start_time: f64,
    pub end_time: f64,
    pub step: f64,
    /// The standard deviation of the additive white noise
    pub noise_level: f64,
    /// Drift added per unit time
    pub drift_slope: f64,
    /// Drift at `start_time`
    pub drift_offset: f64,
    pub seed: Option<u64>,
}

impl Default for ChromatogramSimulator {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: 10.0,
            step: 0.01,
            noise_level: 1.0,
            drift_slope: 5.0,
            drift_offset: 10.0,
            seed: None,
        }
    }
}

impl ChromatogramSimulator {
    pub fn with_time_range(mut self, start_time: f64, end_time: f64, step: f64) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self.step = step;
        self
    }

    pub fn with_noise_level(mut self, noise_level: f64) -> Self {
        self.noise_level = noise_level;
        self
    }

    pub fn with_drift(mut self, drift_slope: f64, drift_offset: f64) -> Self {
        self.drift_slope = drift_slope;
        self.drift_offset = drift_offset;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn make_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Draw one standard normal variate with the Box-Muller transform
    fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }

    /// Render `compounds` onto the configured time grid.
    pub fn simulate(
        &self,
        compounds: &[SimulatedCompound],
        include_noise: bool,
        include_drift: bool,
    ) -> Result<ChromatogramArrays<'static>, SimulationError> {
        if let Some(c) = compounds.iter().find(|c| !(c.fwhm > 0.0)) {
            return Err(SimulationError::InvalidWidth {
                name: c.name.clone(),
                fwhm: c.fwhm,
            });
        }
        if include_noise && !(self.noise_level >= 0.0) {
            return Err(SimulationError::InvalidNoiseLevel(self.noise_level));
        }
        let time_array = gridspace(self.start_time, self.end_time, self.step);
        if time_array.is_empty() {
            return Err(SimulationError::EmptyTimeGrid {
                start: self.start_time,
                end: self.end_time,
                step: self.step,
            });
        }

        let mut intensity_array: Vec<f64> = time_array
            .iter()
            .map(|t| compounds.iter().map(|c| c.signal_at(*t)).sum())
            .collect();

        if include_drift {
            for (y, t) in intensity_array.iter_mut().zip(time_array.iter()) {
                *y += self.drift_offset + self.drift_slope * (t - self.start_time);
            }
        }
        if include_noise {
            let mut rng = self.make_rng();
            for y in intensity_array.iter_mut() {
                *y += self.noise_level * Self::standard_normal(&mut rng);
            }
        }
        debug!(
            "Simulated {} compounds over {} points (noise: {include_noise}, drift: {include_drift})",
            compounds.len(),
            time_array.len()
        );
        Ok(ChromatogramArrays::new(time_array, intensity_array))
    }
}

/// Render `compounds` over `0..=10` in steps of `0.01` with the default noise and drift levels
pub fn simulate_chromatogram(
    compounds: &[SimulatedCompound],
    include_noise: bool,
    include_drift: bool,
    seed: Option<u64>,
) -> Result<ChromatogramArrays<'static>, SimulationError> {
    let simulator = ChromatogramSimulator {
        seed,
        ..Default::default()
    };
    simulator.simulate(compounds, include_noise, include_drift)
}
