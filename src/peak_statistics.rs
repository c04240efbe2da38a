//! Measurements taken on a baseline-corrected signal around a peak apex:
//! noise, prominence, width at half height and integrated area.
use log::debug;
use num_traits::{Float, FromPrimitive};

use crate::arrayops::{median, trapz};
use crate::peak::PeakBoundary;
use crate::smooth::rolling_std;

pub fn _isclose<T>(x: T, y: T, rtol: T, atol: T) -> bool
where
    T: Float,
{
    (x - y).abs() <= (atol + rtol * y.abs())
}

pub fn isclose<T>(x: T, y: T) -> bool
where
    T: Float + FromPrimitive,
{
    _isclose(
        x,
        y,
        T::from_f64(1e-5).unwrap_or_else(T::zero),
        T::from_f64(1e-8).unwrap_or_else(T::zero),
    )
}

pub fn aboutzero<T>(x: T) -> bool
where
    T: Float + FromPrimitive,
{
    isclose(x, T::zero())
}

/// Local noise at every sample: the standard deviation of `corrected` over a
/// centered window of `window` samples.
pub fn local_noise(corrected: &[f64], window: usize) -> Vec<f64> {
    rolling_std(corrected, window)
}

/// The global noise level of a trace, the median of its local noise values.
///
/// The median keeps a handful of busy regions from inflating the estimate.
pub fn noise_level(local_noise: &[f64]) -> f64 {
    median(local_noise)
}

/// Divide `value` by `noise`, reporting zero when there is no measurable noise.
#[inline]
pub fn signal_to_noise(value: f64, noise: f64) -> f64 {
    if aboutzero(noise) {
        0.0
    } else {
        value / noise
    }
}

/// How far the apex at `index` rises above the higher of the lowest points
/// within `window` samples to either side of it. `window` must be positive.
pub fn prominence(corrected: &[f64], index: usize, window: usize) -> f64 {
    let n = corrected.len();
    let apex = corrected[index];
    let left = &corrected[index.saturating_sub(window)..index];
    let right = &corrected[index..index.saturating_add(window).min(n)];
    let left_min = left.iter().copied().fold(f64::INFINITY, f64::min);
    let right_min = right.iter().copied().fold(f64::INFINITY, f64::min);
    // A positive window keeps the apex in the right slice, so this is finite
    let reference = if left.is_empty() {
        right_min
    } else {
        left_min.max(right_min)
    };
    apex - reference
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct WidthFit {
    /// Time of the first sample at or below half height on the rising side
    pub left_time: f64,
    /// Time of the first sample at or below half height on the falling side
    pub right_time: f64,
    pub full_width_at_half_max: f64,
}

/// Fits the left side of a peak, returning the time of the first sample at or
/// below half height.
///
/// Scans at most `max_scan` samples; if the signal never falls to half height
/// the time of the last sample scanned is used.
pub fn fit_rising_side_width(
    time_array: &[f64],
    corrected: &[f64],
    index: usize,
    max_scan: usize,
) -> f64 {
    let half = corrected[index] / 2.0;
    let limit = index.saturating_sub(max_scan);
    (limit..index)
        .rev()
        .find(|j| corrected[*j] <= half)
        .map_or(time_array[limit], |j| time_array[j])
}

/// Fits the right side of a peak, returning the time of the first sample at or
/// below half height.
pub fn fit_falling_side_width(
    time_array: &[f64],
    corrected: &[f64],
    index: usize,
    max_scan: usize,
) -> f64 {
    let n = corrected.len();
    let half = corrected[index] / 2.0;
    let limit = index.saturating_add(max_scan).min(n - 1);
    ((index + 1)..=limit)
        .find(|j| corrected[*j] <= half)
        .map_or(time_array[limit], |j| time_array[j])
}

/// Full width at half maximum of the peak whose apex is at `index`.
pub fn full_width_at_half_max(
    time_array: &[f64],
    corrected: &[f64],
    index: usize,
    max_scan: usize,
) -> WidthFit {
    let apex_time = time_array[index];
    if corrected[index] <= 0.0 {
        return WidthFit {
            left_time: apex_time,
            right_time: apex_time,
            full_width_at_half_max: 0.0,
        };
    }
    let left_time = fit_rising_side_width(time_array, corrected, index, max_scan);
    let right_time = fit_falling_side_width(time_array, corrected, index, max_scan);
    WidthFit {
        left_time,
        right_time,
        full_width_at_half_max: right_time - left_time,
    }
}

/// The integration limits of a peak, as inclusive sample indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationBounds {
    pub start: usize,
    pub end: usize,
    pub boundary: PeakBoundary,
}

/// Walk from `index` along `steps` looking for the first sample at or below zero.
///
/// When none is found, fall back to the lowest sample seen before the flank climbs
/// above the apex into a taller neighbor. The second element is `true` on fallback.
fn find_flank_bound<I>(corrected: &[f64], index: usize, steps: I) -> (usize, bool)
where
    I: Iterator<Item = usize> + Clone,
{
    if let Some(j) = steps.clone().find(|j| corrected[*j] <= 0.0) {
        return (j, false);
    }
    let apex = corrected[index];
    let lowest = steps
        .take_while(|j| corrected[*j] <= apex)
        .fold(index, |lowest, j| {
            if corrected[j] < corrected[lowest] {
                j
            } else {
                lowest
            }
        });
    (lowest, true)
}

/// Find where the peak at `index` returns to the baseline on each side, scanning at
/// most `max_scan` samples outwards.
pub fn integration_bounds(corrected: &[f64], index: usize, max_scan: usize) -> IntegrationBounds {
    let n = corrected.len();
    let (start, left_fallback) =
        find_flank_bound(corrected, index, (index.saturating_sub(max_scan)..index).rev());
    let (end, right_fallback) =
        find_flank_bound(corrected, index, (index + 1)..index.saturating_add(max_scan).saturating_add(1).min(n));
    let boundary = if left_fallback || right_fallback {
        debug!(
            "Peak at index {index} did not return to baseline within {max_scan} samples, bounded at valley {start}..={end}"
        );
        PeakBoundary::Valley
    } else {
        PeakBoundary::Baseline
    };
    IntegrationBounds {
        start,
        end,
        boundary,
    }
}

/// Trapezoidal area of `corrected` between the inclusive indices `start` and `end`
pub fn peak_area(time_array: &[f64], corrected: &[f64], start: usize, end: usize) -> f64 {
    if end <= start {
        return 0.0;
    }
    trapz(&time_array[start..=end], &corrected[start..=end])
}
