use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The number of standard deviations a point lies from its target, or zero
/// when the target has no spread.
#[inline]
pub fn zscore(value: f64, mean: f64, sd: f64) -> f64 {
    if sd == 0.0 {
        0.0
    } else {
        (value - mean) / sd
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown Westgard rule {0:?}")]
pub struct WestgardRuleParseError(pub String);

/// The Westgard control rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WestgardRule {
    /// The latest point lies at least 2 sd from target
    #[cfg_attr(feature = "serde", serde(rename = "1-2s"))]
    OneTwoS,
    /// The latest point lies at least 3 sd from target
    #[cfg_attr(feature = "serde", serde(rename = "1-3s"))]
    OneThreeS,
    /// The latest two points lie at least 2 sd from target on the same side
    #[cfg_attr(feature = "serde", serde(rename = "2-2s"))]
    TwoTwoS,
    /// The latest two points straddle the target and are at least 4 sd apart
    #[cfg_attr(feature = "serde", serde(rename = "R-4s"))]
    RFourS,
    /// The latest four points lie at least 1 sd from target on the same side
    #[cfg_attr(feature = "serde", serde(rename = "4-1s"))]
    FourOneS,
    /// The latest ten points lie on the same side of the target
    #[cfg_attr(feature = "serde", serde(rename = "10-x"))]
    TenX,
}

impl WestgardRule {
    pub const ALL: [WestgardRule; 6] = [
        WestgardRule::OneTwoS,
        WestgardRule::OneThreeS,
        WestgardRule::TwoTwoS,
        WestgardRule::RFourS,
        WestgardRule::FourOneS,
        WestgardRule::TenX,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            WestgardRule::OneTwoS => "1-2s",
            WestgardRule::OneThreeS => "1-3s",
            WestgardRule::TwoTwoS => "2-2s",
            WestgardRule::RFourS => "R-4s",
            WestgardRule::FourOneS => "4-1s",
            WestgardRule::TenX => "10-x",
        }
    }

    /// How many of the most recent points the rule examines
    pub const fn window(&self) -> usize {
        match self {
            WestgardRule::OneTwoS | WestgardRule::OneThreeS => 1,
            WestgardRule::TwoTwoS | WestgardRule::RFourS => 2,
            WestgardRule::FourOneS => 4,
            WestgardRule::TenX => 10,
        }
    }

    /// Strict rules are only checked once a series has enough history
    pub const fn is_strict(&self) -> bool {
        !matches!(self, WestgardRule::OneTwoS | WestgardRule::OneThreeS)
    }

    /// Whether a violation of this rule rejects the run
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, WestgardRule::OneTwoS)
    }

    /// Check the rule against the most recent z-scores of a series, ordered
    /// oldest to newest, returning the indices of the points that make up the
    /// violation. Returns `None` when `zscores` is shorter than [`WestgardRule::window`].
    pub fn violation(&self, zscores: &[f64]) -> Option<Range<usize>> {
        let w = self.window();
        if zscores.len() < w {
            return None;
        }
        let start = zscores.len() - w;
        let tail = &zscores[start..];
        let violated = match self {
            WestgardRule::OneTwoS => tail[0].abs() >= 2.0,
            WestgardRule::OneThreeS => tail[0].abs() >= 3.0,
            WestgardRule::TwoTwoS => {
                tail.iter().all(|z| *z >= 2.0) || tail.iter().all(|z| *z <= -2.0)
            }
            WestgardRule::RFourS => {
                let (z1, z2) = (tail[0], tail[1]);
                z1 * z2 < 0.0 && (z2 - z1).abs() >= 4.0
            }
            WestgardRule::FourOneS => {
                tail.iter().all(|z| *z >= 1.0) || tail.iter().all(|z| *z <= -1.0)
            }
            WestgardRule::TenX => tail.iter().all(|z| *z > 0.0) || tail.iter().all(|z| *z < 0.0),
        };
        violated.then_some(start..zscores.len())
    }

    pub fn is_violated_by(&self, zscores: &[f64]) -> bool {
        self.violation(zscores).is_some()
    }
}

impl fmt::Display for WestgardRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WestgardRule {
    type Err = WestgardRuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        WestgardRule::ALL
            .iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(key))
            .copied()
            .ok_or_else(|| WestgardRuleParseError(s.to_string()))
    }
}
