use std::cmp;
use std::fmt;

use mzpeaks::{CoordinateLike, IndexType, IndexedCoordinate, IntensityMeasurement, Time};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the integration limits of a [`ChromatographicPeak`] were found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PeakBoundary {
    /// Both flanks returned to the baseline
    #[default]
    Baseline,
    /// At least one flank never reached the baseline within the search range and
    /// was cut at the lowest point of that flank instead
    Valley,
}

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// A peak detected in a baseline-corrected chromatogram.
///
/// Implements [`CoordinateLike<Time>`](mzpeaks::CoordinateLike) so it can be used with the
/// `mzpeaks` collection machinery, with the retention time as its coordinate.
pub struct ChromatographicPeak {
    /// The time of the apex
    pub retention_time: f64,
    /// The corrected signal at the apex
    pub height: f64,
    /// The integral of the corrected signal between `start_time` and `end_time`
    pub area: f64,
    /// The full width at half of `height`
    pub width: f64,
    /// `height` divided by the global noise level of the trace
    pub signal_to_noise: f64,
    /// The index of the apex in the source arrays
    pub index: IndexType,
    pub start_time: f64,
    pub end_time: f64,
    pub boundary: PeakBoundary,
}

impl ChromatographicPeak {
    pub fn new(
        retention_time: f64,
        height: f64,
        area: f64,
        width: f64,
        signal_to_noise: f64,
        index: IndexType,
    ) -> Self {
        Self {
            retention_time,
            height,
            area,
            width,
            signal_to_noise,
            index,
            start_time: retention_time,
            end_time: retention_time,
            boundary: PeakBoundary::Baseline,
        }
    }

    /// Set the integration limits this peak's area was computed over
    pub fn with_bounds(mut self, start_time: f64, end_time: f64, boundary: PeakBoundary) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self.boundary = boundary;
        self
    }

    /// The duration between the integration limits
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn contains_time(&self, time: f64) -> bool {
        self.start_time <= time && time <= self.end_time
    }
}

impl PartialEq for ChromatographicPeak {
    fn eq(&self, other: &Self) -> bool {
        (self.retention_time - other.retention_time).abs() < 1e-9
            && (self.height - other.height).abs() < 1e-9
    }
}

impl PartialOrd for ChromatographicPeak {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        match self.retention_time.partial_cmp(&other.retention_time) {
            Some(cmp::Ordering::Equal) => self.height.partial_cmp(&other.height),
            ord => ord,
        }
    }
}

impl CoordinateLike<Time> for ChromatographicPeak {
    #[inline]
    fn coordinate(&self) -> f64 {
        self.retention_time
    }
}

impl IndexedCoordinate<Time> for ChromatographicPeak {
    #[inline]
    fn get_index(&self) -> IndexType {
        self.index
    }

    #[inline]
    fn set_index(&mut self, index: IndexType) {
        self.index = index
    }
}

impl IntensityMeasurement for ChromatographicPeak {
    #[inline]
    fn intensity(&self) -> f32 {
        self.height as f32
    }
}

impl fmt::Display for ChromatographicPeak {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ChromatographicPeak({:0.4}, {}, {}, {:0.4}, {:0.2})",
            self.retention_time, self.height, self.area, self.width, self.signal_to_noise
        )
    }
}
