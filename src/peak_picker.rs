//! Prominence-based peak detection over a baseline-corrected chromatogram.
//!
//! The pipeline run by [`PeakDetector::detect`] is:
//! 1. Estimate a baseline with the configured [`BaselineMethod`] and subtract it.
//! 2. Estimate the local noise at every sample as the standard deviation over a
//!    `noise_window` wide centered window, and take the median as the global noise level.
//! 3. Collect strict local maxima of the corrected signal, excluding the end points.
//! 4. Keep candidates whose prominence exceeds `prominence_threshold` times the noise level.
//! 5. Walking left to right, drop candidates closer than `min_distance` to the last
//!    accepted peak. The first peak seen wins, even if a later one is taller.
//! 6. Measure each accepted peak's area, width and signal-to-noise ratio.
use log::{debug, info, warn};
use thiserror::Error;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::arrayops::{is_increasing, minmax, ChromatogramArrays};
use crate::baseline::{subtract_baseline, BaselineError, BaselineEstimator, BaselineMethod};
use crate::peak::{ChromatographicPeak, PeakBoundary};
use crate::search::nearest;
use crate::peak_statistics::{
    full_width_at_half_max, integration_bounds, local_noise, noise_level, peak_area, prominence,
    signal_to_noise,
};

/// The smallest signal the detector will accept
pub const MINIMUM_SIGNAL_LENGTH: usize = 2;
/// The smallest local noise window the detector will accept
pub const MINIMUM_NOISE_WINDOW: usize = 3;
/// The number of samples on either side of a candidate used to measure prominence
pub const DEFAULT_PROMINENCE_WINDOW: usize = 50;
/// The number of samples on either side of an apex searched for the integration
/// limits and the half-maximum crossings
pub const DEFAULT_BOUNDARY_SEARCH: usize = 100;
/// The rolling minimum baseline window is this many noise windows wide
pub const BASELINE_WINDOW_FACTOR: usize = 5;
/// The standard deviation, in samples, of the filter smoothing the rolling minimum
pub const BASELINE_SMOOTHING_SIGMA: f64 = 2.0;

/// All the ways peak detection can fail
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeakDetectorError {
    #[error("The time and intensity arrays do not match in length: {time} != {intensity}")]
    LengthMismatch { time: usize, intensity: usize },
    #[error("At least 2 points are required, received {0}")]
    TooFewPoints(usize),
    #[error("The time array is not sorted")]
    TimeNotSorted,
    #[error("The intensity at index {0} is not a finite number")]
    NonFiniteIntensity(usize),
    #[error("The prominence threshold must be a positive number, received {0}")]
    InvalidProminenceThreshold(f64),
    #[error("The minimum peak distance must not be negative, received {0}")]
    InvalidMinDistance(f64),
    #[error("The noise window must span at least 3 samples, received {0}")]
    NoiseWindowTooSmall(usize),
    #[error("The {0} must be at least 1 sample")]
    ZeroWidthWindow(&'static str),
    #[error("The baseline smoothing sigma must be a finite, non-negative number, received {0}")]
    InvalidBaselineSigma(f64),
    #[error(transparent)]
    Baseline(#[from] BaselineError),
}

/// The outcome of running a [`PeakDetector`] over one chromatogram
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakDetection {
    /// Detected peaks in ascending retention time order
    pub peaks: Vec<ChromatographicPeak>,
    /// The estimated baseline, one value per input sample
    pub baseline: Vec<f64>,
    /// The median local noise of the corrected signal
    pub noise_level: f64,
    /// The largest corrected intensity divided by `noise_level`, never negative
    pub signal_to_noise_ratio: f64,
}

impl PeakDetection {
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChromatographicPeak> {
        self.peaks.iter()
    }

    /// The peak with the greatest area, if any
    pub fn largest_peak(&self) -> Option<&ChromatographicPeak> {
        self.peaks
            .iter()
            .max_by(|a, b| a.area.total_cmp(&b.area))
    }

    /// The peak whose apex is closest to `retention_time`
    pub fn peak_nearest(&self, retention_time: f64) -> Option<&ChromatographicPeak> {
        let times: Vec<f64> = self.peaks.iter().map(|p| p.retention_time).collect();
        nearest(&times, retention_time).map(|i| &self.peaks[i])
    }

    /// The total area of all detected peaks
    pub fn total_area(&self) -> f64 {
        self.peaks.iter().map(|p| p.area).sum()
    }
}

/// A peak detector for chromatograms
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakDetector {
    /// Multiple of the noise level a candidate's prominence must exceed
    pub prominence_threshold: f64,
    /// Minimum separation between accepted apexes, in time units
    pub min_distance: f64,
    /// Width of the local noise window, in samples
    pub noise_window: usize,
    pub baseline_method: BaselineMethod,
    /// Samples on either side of a candidate considered when measuring prominence
    pub prominence_window: usize,
    /// Samples on either side of an apex searched for peak limits
    pub boundary_search: usize,
    /// The rolling minimum baseline window is `noise_window * baseline_window_factor` samples
    pub baseline_window_factor: usize,
    pub baseline_sigma: f64,
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self {
            prominence_threshold: 3.0,
            min_distance: 0.05,
            noise_window: 50,
            baseline_method: BaselineMethod::RollingMin,
            prominence_window: DEFAULT_PROMINENCE_WINDOW,
            boundary_search: DEFAULT_BOUNDARY_SEARCH,
            baseline_window_factor: BASELINE_WINDOW_FACTOR,
            baseline_sigma: BASELINE_SMOOTHING_SIGMA,
        }
    }
}

/// A builder for configuring [`PeakDetector`]
#[derive(Debug, Clone, Default)]
pub struct PeakDetectorBuilder {
    inner: PeakDetector,
}

impl PeakDetectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prominence_threshold(&mut self, prominence_threshold: f64) -> &mut Self {
        self.inner.prominence_threshold = prominence_threshold;
        self
    }

    pub fn min_distance(&mut self, min_distance: f64) -> &mut Self {
        self.inner.min_distance = min_distance;
        self
    }

    pub fn noise_window(&mut self, noise_window: usize) -> &mut Self {
        self.inner.noise_window = noise_window;
        self
    }

    pub fn baseline_method(&mut self, baseline_method: BaselineMethod) -> &mut Self {
        self.inner.baseline_method = baseline_method;
        self
    }

    pub fn prominence_window(&mut self, prominence_window: usize) -> &mut Self {
        self.inner.prominence_window = prominence_window;
        self
    }

    pub fn boundary_search(&mut self, boundary_search: usize) -> &mut Self {
        self.inner.boundary_search = boundary_search;
        self
    }

    pub fn baseline_window_factor(&mut self, baseline_window_factor: usize) -> &mut Self {
        self.inner.baseline_window_factor = baseline_window_factor;
        self
    }

    pub fn baseline_sigma(&mut self, baseline_sigma: f64) -> &mut Self {
        self.inner.baseline_sigma = baseline_sigma;
        self
    }

    /// Check the configuration and produce a [`PeakDetector`]
    pub fn build(&self) -> Result<PeakDetector, PeakDetectorError> {
        self.inner.validate()?;
        Ok(self.inner.clone())
    }
}

impl PeakDetector {
    /// Create a new peak detector with the default search windows
    pub fn new(
        prominence_threshold: f64,
        min_distance: f64,
        noise_window: usize,
        baseline_method: BaselineMethod,
    ) -> Self {
        Self {
            prominence_threshold,
            min_distance,
            noise_window,
            baseline_method,
            ..Default::default()
        }
    }

    pub fn builder() -> PeakDetectorBuilder {
        PeakDetectorBuilder::new()
    }

    /// Check that the configured parameters are usable
    pub fn validate(&self) -> Result<(), PeakDetectorError> {
        if !(self.prominence_threshold.is_finite() && self.prominence_threshold > 0.0) {
            return Err(PeakDetectorError::InvalidProminenceThreshold(
                self.prominence_threshold,
            ));
        }
        if !(self.min_distance.is_finite() && self.min_distance >= 0.0) {
            return Err(PeakDetectorError::InvalidMinDistance(self.min_distance));
        }
        if self.noise_window < MINIMUM_NOISE_WINDOW {
            return Err(PeakDetectorError::NoiseWindowTooSmall(self.noise_window));
        }
        if self.prominence_window == 0 {
            return Err(PeakDetectorError::ZeroWidthWindow("prominence window"));
        }
        if self.boundary_search == 0 {
            return Err(PeakDetectorError::ZeroWidthWindow("boundary search"));
        }
        if self.baseline_window_factor == 0 {
            return Err(PeakDetectorError::ZeroWidthWindow("baseline window factor"));
        }
        if !(self.baseline_sigma.is_finite() && self.baseline_sigma >= 0.0) {
            return Err(PeakDetectorError::InvalidBaselineSigma(self.baseline_sigma));
        }
        Ok(())
    }

    /// Check that `time_array` and `intensity_array` describe a usable signal
    pub fn validate_input(
        &self,
        time_array: &[f64],
        intensity_array: &[f64],
    ) -> Result<(), PeakDetectorError> {
        if time_array.len() != intensity_array.len() {
            return Err(PeakDetectorError::LengthMismatch {
                time: time_array.len(),
                intensity: intensity_array.len(),
            });
        }
        if time_array.len() < MINIMUM_SIGNAL_LENGTH {
            return Err(PeakDetectorError::TooFewPoints(time_array.len()));
        }
        if !is_increasing(time_array) {
            return Err(PeakDetectorError::TimeNotSorted);
        }
        if let Some(i) = intensity_array.iter().position(|y| !y.is_finite()) {
            return Err(PeakDetectorError::NonFiniteIntensity(i));
        }
        Ok(())
    }

    /// The baseline estimator implied by this configuration
    pub fn baseline_estimator(&self) -> BaselineEstimator {
        BaselineEstimator::new(
            self.baseline_method,
            self.noise_window.saturating_mul(self.baseline_window_factor),
            self.baseline_sigma,
        )
    }

    fn is_local_maximum(&self, prev: f64, cur: f64, next: f64) -> bool {
        cur > prev && cur > next
    }

    /// Interior indices of `corrected` that are strict local maxima and rise
    /// more than `threshold` above their surroundings
    fn prominent_candidates(&self, corrected: &[f64], threshold: f64) -> Vec<usize> {
        let n = corrected.len();
        if n < 3 {
            return Vec::new();
        }
        (1..n - 1)
            .filter(|i| {
                self.is_local_maximum(corrected[i - 1], corrected[*i], corrected[i + 1])
            })
            .filter(|i| prominence(corrected, *i, self.prominence_window) > threshold)
            .collect()
    }

    /// Measure the area, width and signal-to-noise ratio of the peak at `index`
    fn measure_peak(
        &self,
        time_array: &[f64],
        corrected: &[f64],
        index: usize,
        noise: f64,
    ) -> ChromatographicPeak {
        let height = corrected[index];
        let bounds = integration_bounds(corrected, index, self.boundary_search);
        let area = peak_area(time_array, corrected, bounds.start, bounds.end);
        let width = full_width_at_half_max(time_array, corrected, index, self.boundary_search);
        ChromatographicPeak::new(
            time_array[index],
            height,
            area,
            width.full_width_at_half_max,
            signal_to_noise(height, noise),
            index as u32,
        )
        .with_bounds(time_array[bounds.start], time_array[bounds.end], bounds.boundary)
    }

    /// Detect peaks in the signal described by `time_array` and `intensity_array`.
    pub fn detect(
        &self,
        time_array: &[f64],
        intensity_array: &[f64],
    ) -> Result<PeakDetection, PeakDetectorError> {
        self.validate()?;
        self.validate_input(time_array, intensity_array)?;

        let baseline = self.baseline_estimator().estimate(time_array, intensity_array)?;
        let corrected = subtract_baseline(intensity_array, &baseline);

        let noise = noise_level(&local_noise(&corrected, self.noise_window));
        let threshold = self.prominence_threshold * noise;

        let candidates = self.prominent_candidates(&corrected, threshold);
        debug!(
            "{} candidates exceed a prominence of {threshold:0.4}",
            candidates.len()
        );

        let mut peaks: Vec<ChromatographicPeak> = Vec::with_capacity(candidates.len());
        for index in candidates {
            let retention_time = time_array[index];
            if let Some(last) = peaks.last() {
                if retention_time - last.retention_time < self.min_distance {
                    debug!(
                        "Skipping candidate at {retention_time:0.4}, within {} of {:0.4}",
                        self.min_distance, last.retention_time
                    );
                    continue;
                }
            }
            peaks.push(self.measure_peak(time_array, &corrected, index, noise));
        }

        let valley_bounded = peaks
            .iter()
            .filter(|p| p.boundary == PeakBoundary::Valley)
            .count();
        if valley_bounded > 0 {
            warn!(
                "{valley_bounded} of {} peaks did not return to baseline within {} samples and were integrated to their valleys",
                peaks.len(),
                self.boundary_search
            );
        }

        let (_, max_corrected) = minmax(&corrected);
        let signal_to_noise_ratio = signal_to_noise(max_corrected, noise).max(0.0);
        info!(
            "Detected {} peaks with noise level {noise:0.4} and signal to noise ratio {signal_to_noise_ratio:0.2}",
            peaks.len()
        );

        Ok(PeakDetection {
            peaks,
            baseline,
            noise_level: noise,
            signal_to_noise_ratio,
        })
    }

    /// Detect peaks in a [`ChromatogramArrays`] pair
    pub fn detect_arrays(
        &self,
        arrays: &ChromatogramArrays<'_>,
    ) -> Result<PeakDetection, PeakDetectorError> {
        self.detect(&arrays.time_array, &arrays.intensity_array)
    }

    /// Detect peaks in each of `signals` independently. A failure on one signal
    /// is reported in its own slot and does not affect the others.
    pub fn detect_batch(
        &self,
        signals: &[ChromatogramArrays<'_>],
    ) -> Vec<Result<PeakDetection, PeakDetectorError>> {
        #[cfg(feature = "parallelism")]
        let results: Vec<_> = signals
            .par_iter()
            .map(|arrays| self.detect_arrays(arrays))
            .collect();
        #[cfg(not(feature = "parallelism"))]
        let results: Vec<_> = signals
            .iter()
            .map(|arrays| self.detect_arrays(arrays))
            .collect();

        let failures = results.iter().filter(|r| r.is_err()).count();
        if failures > 0 {
            warn!("{failures} of {} signals failed peak detection", signals.len());
        }
        results
    }
}

/// A convenience function that configures a [`PeakDetector`] with default search
/// windows and runs it over paired time and intensity arrays.
pub fn detect_peaks(
    time_array: &[f64],
    intensity_array: &[f64],
    prominence_threshold: f64,
    min_distance: f64,
    noise_window: usize,
    baseline_method: BaselineMethod,
) -> Result<PeakDetection, PeakDetectorError> {
    PeakDetector::new(
        prominence_threshold,
        min_distance,
        noise_window,
        baseline_method,
    )
    .detect(time_array, intensity_array)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_data::{clean_three_peaks, gaussian_signal, noisy_three_peaks, PEAK_CENTERS};
    use rstest::rstest;

    #[test_log::test]
    fn test_clean_synthetic_chromatogram() {
        let arrays = clean_three_peaks();
        let result = detect_peaks(
            &arrays.time_array,
            &arrays.intensity_array,
            3.0,
            0.1,
            50,
            BaselineMethod::None,
        )
        .expect("Should not encounter an error");
        assert_eq!(result.len(), 3);
        for (peak, center) in result.iter().zip(PEAK_CENTERS.iter()) {
            assert!(
                (peak.retention_time - center).abs() < 0.05,
                "{} vs {center}",
                peak.retention_time
            );
            assert!(peak.height > 0.0);
            assert!(peak.area > 0.0);
            // the half height falls between samples, so the first sample at or
            // below it is 0.05 or 0.06 from the apex
            assert!(peak.width > 0.099 && peak.width < 0.121, "{}", peak.width);
        }
        assert!(result.signal_to_noise_ratio >= 0.0);
        assert!(result.baseline.iter().all(|b| *b == 0.0));
        let middle = result.peak_nearest(4.2).unwrap();
        assert!((middle.retention_time - 5.0).abs() < 0.05);
        assert!(result.total_area() > 0.0);
    }

    #[test_log::test]
    fn test_noisy_drifting_chromatogram() {
        let arrays = noisy_three_peaks(42);
        let detector = PeakDetector::builder()
            .prominence_threshold(10.0)
            .min_distance(0.5)
            .noise_window(50)
            .baseline_method(BaselineMethod::RollingMin)
            .build()
            .unwrap();
        let result = detector.detect_arrays(&arrays).unwrap();
        assert_eq!(result.len(), 3, "{:?}", result.peaks);
        for (peak, center) in result.iter().zip(PEAK_CENTERS.iter()) {
            assert!((peak.retention_time - center).abs() < 0.05);
            assert!(peak.signal_to_noise > 10.0);
        }
        assert!(result.noise_level > 1.0 && result.noise_level < 4.0);
        assert!(result.signal_to_noise_ratio > 100.0);
    }

    #[rstest]
    #[case(BaselineMethod::None)]
    #[case(BaselineMethod::RollingMin)]
    #[case(BaselineMethod::Polynomial)]
    fn test_length_invariant_and_determinism(#[case] method: BaselineMethod) {
        let arrays = noisy_three_peaks(7);
        let detector = PeakDetector::new(10.0, 0.5, 25, method);
        let first = detector.detect_arrays(&arrays).unwrap();
        let second = detector.detect_arrays(&arrays).unwrap();
        assert_eq!(first.baseline.len(), arrays.len());
        assert_eq!(first, second);
        assert_eq!(first.baseline, second.baseline);
        assert!(!first.is_empty());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.area.to_bits(), b.area.to_bits());
            assert_eq!(a.width.to_bits(), b.width.to_bits());
            assert_eq!(a.signal_to_noise.to_bits(), b.signal_to_noise.to_bits());
            assert_eq!((a.start_time, a.end_time), (b.start_time, b.end_time));
            assert_eq!(a.boundary, b.boundary);
        }
        assert!(first
            .peaks
            .windows(2)
            .all(|w| w[0].retention_time < w[1].retention_time));
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.3)]
    #[case(1.0)]
    #[case(4.0)]
    fn test_min_distance_property(#[case] min_distance: f64) {
        let arrays = noisy_three_peaks(3);
        let detector = PeakDetector::new(2.0, min_distance, 50, BaselineMethod::RollingMin);
        let result = detector.detect_arrays(&arrays).unwrap();
        for (i, p) in result.iter().enumerate() {
            for q in result.peaks[i + 1..].iter() {
                assert!((q.retention_time - p.retention_time).abs() >= min_distance);
            }
        }
    }

    #[test]
    fn test_first_peak_wins_distance_conflict() {
        let (time, mut intensity) = gaussian_signal(4.8, 0.02, 100.0);
        let (_, tall) = gaussian_signal(5.0, 0.02, 500.0);
        intensity.iter_mut().zip(tall).for_each(|(a, b)| *a += b);
        let result =
            detect_peaks(&time, &intensity, 3.0, 0.3, 50, BaselineMethod::None).unwrap();
        assert_eq!(result.len(), 1);
        assert!((result.peaks[0].retention_time - 4.8).abs() < 1e-6);

        let result =
            detect_peaks(&time, &intensity, 3.0, 0.1, 50, BaselineMethod::None).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_no_noise_gives_zero_snr() {
        let time: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
        let intensity = vec![-5.0; 100];
        let result = detect_peaks(&time, &intensity, 3.0, 0.0, 5, BaselineMethod::None).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.noise_level, 0.0);
        assert_eq!(result.signal_to_noise_ratio, 0.0);
    }

    #[test]
    fn test_two_point_signal() {
        let result =
            detect_peaks(&[0.0, 1.0], &[1.0, 2.0], 3.0, 0.0, 3, BaselineMethod::None).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.baseline.len(), 2);
    }

    #[test_log::test]
    #[test_log(default_log_filter = "debug")]
    fn test_wide_peak_bounded_at_valley() {
        let (time, intensity) = gaussian_signal(5.0, 0.5, 100.0);
        let intensity: Vec<f64> = intensity.into_iter().map(|y| y + 1.0).collect();
        let result = detect_peaks(&time, &intensity, 3.0, 0.0, 50, BaselineMethod::None).unwrap();
        assert_eq!(result.len(), 1);
        let peak = &result.peaks[0];
        assert_eq!(peak.boundary, PeakBoundary::Valley);
        assert!(peak.duration() > 1.9);
        let expected = 100.0 * 0.5 * (2.0 * std::f64::consts::PI).sqrt();
        assert!(peak.area > 0.9 * expected && peak.area < 1.1 * expected);
    }

    #[rstest]
    #[case(vec![0.0, 1.0, 2.0], vec![1.0, 2.0], PeakDetectorError::LengthMismatch { time: 3, intensity: 2 })]
    #[case(vec![0.0], vec![1.0], PeakDetectorError::TooFewPoints(1))]
    #[case(vec![0.0, 2.0, 1.0], vec![1.0, 2.0, 1.0], PeakDetectorError::TimeNotSorted)]
    #[case(vec![0.0, 1.0, 2.0], vec![1.0, f64::NAN, 1.0], PeakDetectorError::NonFiniteIntensity(1))]
    fn test_invalid_input(
        #[case] time: Vec<f64>,
        #[case] intensity: Vec<f64>,
        #[case] expected: PeakDetectorError,
    ) {
        let err = PeakDetector::default()
            .detect(&time, &intensity)
            .unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn test_invalid_configuration() {
        let err = PeakDetector::builder()
            .prominence_threshold(0.0)
            .build()
            .unwrap_err();
        assert_eq!(err, PeakDetectorError::InvalidProminenceThreshold(0.0));

        let err = PeakDetector::builder().min_distance(-1.0).build().unwrap_err();
        assert_eq!(err, PeakDetectorError::InvalidMinDistance(-1.0));

        let err = PeakDetector::builder().noise_window(2).build().unwrap_err();
        assert_eq!(err, PeakDetectorError::NoiseWindowTooSmall(2));
    }

    #[rstest]
    #[case(PeakDetector { prominence_window: 0, ..Default::default() }, PeakDetectorError::ZeroWidthWindow("prominence window"))]
    #[case(PeakDetector { boundary_search: 0, ..Default::default() }, PeakDetectorError::ZeroWidthWindow("boundary search"))]
    #[case(PeakDetector { baseline_window_factor: 0, ..Default::default() }, PeakDetectorError::ZeroWidthWindow("baseline window factor"))]
    #[case(PeakDetector { baseline_sigma: -1.0, ..Default::default() }, PeakDetectorError::InvalidBaselineSigma(-1.0))]
    #[case(PeakDetector { baseline_sigma: f64::INFINITY, ..Default::default() }, PeakDetectorError::InvalidBaselineSigma(f64::INFINITY))]
    fn test_invalid_windows(#[case] detector: PeakDetector, #[case] expected: PeakDetectorError) {
        let arrays = clean_three_peaks();
        assert_eq!(detector.detect_arrays(&arrays).unwrap_err(), expected);
    }

    #[test]
    fn test_nan_baseline_sigma_rejected() {
        let err = PeakDetector::builder()
            .baseline_sigma(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, PeakDetectorError::InvalidBaselineSigma(s) if s.is_nan()));
    }

    #[rstest]
    #[case(BaselineMethod::None)]
    #[case(BaselineMethod::RollingMin)]
    fn test_oversized_windows_do_not_overflow(#[case] method: BaselineMethod) {
        let arrays = clean_three_peaks();
        let detector = PeakDetector::builder()
            .noise_window(usize::MAX)
            .baseline_window_factor(usize::MAX)
            .prominence_window(usize::MAX)
            .boundary_search(usize::MAX)
            .baseline_method(method)
            .build()
            .unwrap();
        let result = detector.detect_arrays(&arrays).unwrap();
        assert_eq!(result.baseline.len(), arrays.len());
    }

    #[test]
    fn test_batch_collects_errors() {
        let good = clean_three_peaks();
        let bad = ChromatogramArrays::new(vec![0.0, 1.0, 2.0], vec![1.0]);
        let detector = PeakDetector::new(3.0, 0.1, 50, BaselineMethod::None);
        let results = detector.detect_batch(&[good.borrow(), bad, good.borrow()]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().len(), 3);
        assert!(matches!(
            results[1],
            Err(PeakDetectorError::LengthMismatch { .. })
        ));
        assert_eq!(results[0], results[2]);
    }
}
