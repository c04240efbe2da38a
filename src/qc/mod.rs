//! Statistical process control for control sample measurements using the
//! Westgard multi-rule scheme.
//!
//! Each [`QCTimeSeriesPoint`] carries its own target mean and standard deviation,
//! so targets may shift over the life of a series. [`evaluate_rules`] groups points
//! by analyte, orders them by timestamp, and checks the tail of each series against
//! every [`WestgardRule`]. Rules spanning more than one point only apply once the
//! series is at least [`QCPolicy::require_n_before_strict`] points long.
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use gcsignal::qc::{evaluate_rules, QCPolicy, QCStatus, QCTimeSeriesPoint, WestgardRule};
//!
//! let values = [101.0, 99.0, 102.0, 98.0, 100.0, 116.0];
//! let points: Vec<_> = values
//!     .iter()
//!     .enumerate()
//!     .map(|(i, v)| {
//!         let ts = Utc.timestamp_opt(1_700_000_000 + i as i64 * 3600, 0).unwrap();
//!         QCTimeSeriesPoint::new("benzene", ts, *v, 100.0, 5.0)
//!     })
//!     .collect();
//!
//! let evaluation = evaluate_rules(&points, &QCPolicy::default());
//! let result = &evaluation.analyte_results["benzene"];
//! assert_eq!(result.status, QCStatus::Fail);
//! assert!(result.flags.contains(&WestgardRule::OneThreeS));
//! ```
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod engine;
mod rules;
pub mod targets;

pub use engine::{evaluate_history, evaluate_rules, QCEvaluation};
pub use rules::{zscore, WestgardRule, WestgardRuleParseError};
pub use targets::{assign_rolling_targets, ControlTarget};

/// One control measurement for one analyte
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QCTimeSeriesPoint {
    pub analyte: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    /// The target value
    pub mean: f64,
    /// The target standard deviation
    pub sd: f64,
}

impl QCTimeSeriesPoint {
    pub fn new(
        analyte: impl Into<String>,
        timestamp: DateTime<Utc>,
        value: f64,
        mean: f64,
        sd: f64,
    ) -> Self {
        Self {
            analyte: analyte.into(),
            timestamp,
            value,
            mean,
            sd,
        }
    }

    /// The number of standard deviations this point lies from its target
    pub fn zscore(&self) -> f64 {
        zscore(self.value, self.mean, self.sd)
    }
}

/// A single rule violation, recorded against one of the points that make it up
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QCRuleHit {
    pub rule: WestgardRule,
    pub analyte: String,
    pub value: f64,
    pub zscore: f64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for QCRuleHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} violated {} at {} (value {}, z {:0.2})",
            self.analyte,
            self.rule,
            self.timestamp.to_rfc3339(),
            self.value,
            self.zscore
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown QC status {0:?}, expected one of PASS, WARN or FAIL")]
pub struct QCStatusParseError(pub String);

/// The disposition of an analyte's latest control measurement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum QCStatus {
    #[default]
    Pass,
    Warn,
    Fail,
}

impl QCStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            QCStatus::Pass => "PASS",
            QCStatus::Warn => "WARN",
            QCStatus::Fail => "FAIL",
        }
    }

    /// Derive a status from the rules that fired on a point
    pub fn from_flags(flags: &[WestgardRule], policy: &QCPolicy) -> Self {
        if flags.iter().any(|r| r.is_rejection()) {
            QCStatus::Fail
        } else if !flags.is_empty() && policy.warn_on_1_2s {
            QCStatus::Warn
        } else {
            QCStatus::Pass
        }
    }
}

impl fmt::Display for QCStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QCStatus {
    type Err = QCStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PASS" => Ok(QCStatus::Pass),
            "WARN" => Ok(QCStatus::Warn),
            "FAIL" => Ok(QCStatus::Fail),
            _ => Err(QCStatusParseError(s.to_string())),
        }
    }
}

/// The summary of an analyte's most recent control measurement
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QCResult {
    pub analyte: String,
    pub value: f64,
    pub zscore: f64,
    pub timestamp: DateTime<Utc>,
    /// The rules that fired on this point
    pub flags: Vec<WestgardRule>,
    pub status: QCStatus,
}

impl QCResult {
    pub fn is_acceptable(&self) -> bool {
        self.status != QCStatus::Fail
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QCPolicyError {
    #[error("Multi-point rules need at least one point of history, received {0}")]
    InvalidStrictLength(usize),
}

/// Controls how strictly the rules are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QCPolicy {
    /// The series length below which only single point rules are checked
    pub require_n_before_strict: usize,
    /// Report a lone 1-2s violation as [`QCStatus::Warn`] rather than [`QCStatus::Pass`]
    pub warn_on_1_2s: bool,
}

impl Default for QCPolicy {
    fn default() -> Self {
        Self {
            require_n_before_strict: 6,
            warn_on_1_2s: true,
        }
    }
}

impl QCPolicy {
    pub fn new(require_n_before_strict: usize, warn_on_1_2s: bool) -> Result<Self, QCPolicyError> {
        if require_n_before_strict == 0 {
            return Err(QCPolicyError::InvalidStrictLength(require_n_before_strict));
        }
        Ok(Self {
            require_n_before_strict,
            warn_on_1_2s,
        })
    }

    /// Whether `rule` may be checked against a series of `length` points
    pub fn allows(&self, rule: WestgardRule, length: usize) -> bool {
        if length < rule.window() {
            return false;
        }
        !rule.is_strict() || length >= self.require_n_before_strict
    }
}
