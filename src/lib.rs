//! `gcsignal` is a library for turning gas chromatography detector traces into
//! integrated peak lists, and for judging control sample results against the
//! Westgard rules.
//!
//! Peak detection can be used directly with [`PeakDetector`], which subtracts an
//! estimated baseline, measures the noise of the corrected trace and keeps local
//! maxima that are sufficiently prominent above it. Each [`ChromatographicPeak`]
//! reports its retention time, height, area, width at half height and signal to
//! noise ratio.
//!
//! Control measurements are evaluated by [`qc::evaluate_rules`], which reports every
//! rule violation along with a pass, warn or fail status for the latest point of
//! each analyte.
//!
//! # Usage
//! ```
//! use gcsignal::simulate::{simulate_chromatogram, SimulatedCompound};
//! use gcsignal::{BaselineMethod, PeakDetector};
//!
//! let compounds = vec![
//!     SimulatedCompound::new("benzene", 2.0, 1000.0, 0.1),
//!     SimulatedCompound::new("toluene", 5.0, 800.0, 0.1),
//!     SimulatedCompound::new("xylene", 8.0, 600.0, 0.1),
//! ];
//! let arrays = simulate_chromatogram(&compounds, false, false, None).unwrap();
//!
//! let detector = PeakDetector::builder()
//!     .prominence_threshold(3.0)
//!     .min_distance(0.1)
//!     .baseline_method(BaselineMethod::None)
//!     .build()
//!     .unwrap();
//! let detection = detector.detect(&arrays.time_array, &arrays.intensity_array).unwrap();
//! assert_eq!(detection.len(), 3);
//! for peak in detection.iter() {
//!     println!("{}", peak);
//! }
//! ```
//! ## Building
//! Polynomial baselines and calibration curves are fit with `nalgebra` when the
//! default `nalgebra` feature is enabled, and with a small normal equation solver
//! otherwise. The `parallelism` feature runs [`PeakDetector::detect_batch`] on
//! `rayon`'s thread pool, and `serde` makes the public records serializable.
pub mod arrayops;
pub mod baseline;
pub mod peak;
pub mod peak_picker;
pub mod peak_statistics;
pub mod qc;
pub mod quantify;
pub mod search;
pub mod simulate;
pub mod smooth;
pub mod text;

#[cfg(test)]
mod test_data;

pub use crate::arrayops::ChromatogramArrays;
pub use crate::baseline::{estimate_baseline, BaselineError, BaselineMethod};
pub use crate::peak::{ChromatographicPeak, PeakBoundary};
pub use crate::peak_picker::{
    detect_peaks, PeakDetection, PeakDetector, PeakDetectorBuilder, PeakDetectorError,
};
pub use crate::qc::{
    evaluate_rules, QCPolicy, QCResult, QCRuleHit, QCStatus, QCTimeSeriesPoint, WestgardRule,
};
