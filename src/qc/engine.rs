use std::collections::BTreeMap;

use log::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::rules::WestgardRule;
use super::{QCPolicy, QCResult, QCRuleHit, QCStatus, QCTimeSeriesPoint};

/// The violations found in a set of control series and the disposition of each
/// analyte's latest point
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QCEvaluation {
    pub rule_hits: Vec<QCRuleHit>,
    pub analyte_results: BTreeMap<String, QCResult>,
}

impl QCEvaluation {
    pub fn is_empty(&self) -> bool {
        self.rule_hits.is_empty() && self.analyte_results.is_empty()
    }

    /// The most severe status across all analytes, [`QCStatus::Pass`] when there are none
    pub fn overall_status(&self) -> QCStatus {
        self.analyte_results
            .values()
            .map(|r| r.status)
            .max()
            .unwrap_or_default()
    }

    pub fn hits_for<'a>(&'a self, analyte: &'a str) -> impl Iterator<Item = &'a QCRuleHit> + 'a {
        self.rule_hits.iter().filter(move |h| h.analyte == analyte)
    }

    /// The analytes whose latest point failed
    pub fn failures(&self) -> impl Iterator<Item = &QCResult> {
        self.analyte_results
            .values()
            .filter(|r| r.status == QCStatus::Fail)
    }
}

/// Split `points` by analyte and order each series by timestamp. The sort is
/// stable so points sharing a timestamp keep their input order.
fn group_by_analyte(points: &[QCTimeSeriesPoint]) -> BTreeMap<&str, Vec<&QCTimeSeriesPoint>> {
    let mut groups: BTreeMap<&str, Vec<&QCTimeSeriesPoint>> = BTreeMap::new();
    for point in points {
        groups.entry(point.analyte.as_str()).or_default().push(point);
    }
    for series in groups.values_mut() {
        series.sort_by_key(|p| p.timestamp);
    }
    groups
}

/// Check every rule against the tail of `series`, recording a hit for each point
/// that takes part in a violation
fn evaluate_tail(
    series: &[&QCTimeSeriesPoint],
    zscores: &[f64],
    policy: &QCPolicy,
    hits: &mut Vec<QCRuleHit>,
) {
    for rule in WestgardRule::ALL {
        if !policy.allows(rule, series.len()) {
            continue;
        }
        let Some(indices) = rule.violation(zscores) else {
            continue;
        };
        for idx in indices {
            let point = series[idx];
            let z = zscores[idx];
            debug!(
                "{} violated {rule} at {} with z = {z:0.3}",
                point.analyte, point.timestamp
            );
            hits.push(QCRuleHit {
                rule,
                analyte: point.analyte.clone(),
                value: point.value,
                zscore: z,
                timestamp: point.timestamp,
            });
        }
    }
}

fn summarize_latest(
    series: &[&QCTimeSeriesPoint],
    zscores: &[f64],
    analyte_hits: &[QCRuleHit],
    policy: &QCPolicy,
) -> Option<QCResult> {
    let latest = series.last()?;
    let zscore = zscores.last().copied().unwrap_or_default();
    let flags: Vec<WestgardRule> = analyte_hits
        .iter()
        .filter(|h| h.timestamp == latest.timestamp)
        .map(|h| h.rule)
        .collect();
    let status = QCStatus::from_flags(&flags, policy);
    Some(QCResult {
        analyte: latest.analyte.clone(),
        value: latest.value,
        zscore,
        timestamp: latest.timestamp,
        flags,
        status,
    })
}

fn evaluate_with<F>(points: &[QCTimeSeriesPoint], policy: &QCPolicy, mut scan: F) -> QCEvaluation
where
    F: FnMut(&[&QCTimeSeriesPoint], &[f64], &mut Vec<QCRuleHit>),
{
    let mut evaluation = QCEvaluation::default();
    for (analyte, series) in group_by_analyte(points) {
        let zscores: Vec<f64> = series.iter().map(|p| p.zscore()).collect();
        let mut hits = Vec::new();
        scan(&series, &zscores, &mut hits);
        if let Some(result) = summarize_latest(&series, &zscores, &hits, policy) {
            if result.status == QCStatus::Fail {
                warn!(
                    "{analyte} failed QC at {} with {:?}",
                    result.timestamp,
                    result.flags.iter().map(|r| r.as_str()).collect::<Vec<_>>()
                );
            }
            evaluation
                .analyte_results
                .insert(analyte.to_string(), result);
        }
        evaluation.rule_hits.extend(hits);
    }
    info!(
        "Evaluated {} points across {} analytes, {} rule hits",
        points.len(),
        evaluation.analyte_results.len(),
        evaluation.rule_hits.len()
    );
    evaluation
}

/// Evaluate the Westgard rules against the most recent points of each analyte's series.
///
/// Points may arrive in any order and may mix analytes. Each series is sorted by
/// timestamp before evaluation. A rule that fires is recorded once for every point
/// in its window, so a 2-2s violation yields two hits. Only hits on the latest
/// point count towards its status. An empty input produces an empty evaluation.
pub fn evaluate_rules(points: &[QCTimeSeriesPoint], policy: &QCPolicy) -> QCEvaluation {
    evaluate_with(points, policy, |series, zscores, hits| {
        evaluate_tail(series, zscores, policy, hits)
    })
}

/// Replay each analyte's series one point at a time, as if [`evaluate_rules`]
/// had been called after every measurement arrived, collecting every hit along
/// the way. The latest point summaries match those of [`evaluate_rules`].
pub fn evaluate_history(points: &[QCTimeSeriesPoint], policy: &QCPolicy) -> QCEvaluation {
    evaluate_with(points, policy, |series, zscores, hits| {
        for end in 1..=series.len() {
            evaluate_tail(&series[..end], &zscores[..end], policy, hits)
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn series(analyte: &str, values: &[f64], mean: f64, sd: f64) -> Vec<QCTimeSeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                QCTimeSeriesPoint::new(analyte, start() + Duration::hours(i as i64), *v, mean, sd)
            })
            .collect()
    }

    fn rules_hit(evaluation: &QCEvaluation) -> Vec<WestgardRule> {
        evaluation.rule_hits.iter().map(|h| h.rule).collect()
    }

    #[test_log::test]
    fn test_one_three_s_on_last_point() {
        let values = [
            101.0, 99.0, 103.0, 97.0, 102.0, 98.0, 104.0, 96.0, 101.0, 99.0, 100.0, 116.0,
        ];
        let points = series("benzene", &values, 100.0, 5.0);
        let evaluation = evaluate_rules(&points, &QCPolicy::default());
        let one_three: Vec<_> = evaluation
            .rule_hits
            .iter()
            .filter(|h| h.rule == WestgardRule::OneThreeS)
            .collect();
        assert_eq!(one_three.len(), 1);
        assert_eq!(one_three[0].timestamp, points[11].timestamp);
        assert!((one_three[0].zscore - 3.2).abs() < 1e-9);
        assert_eq!(
            rules_hit(&evaluation),
            vec![WestgardRule::OneTwoS, WestgardRule::OneThreeS]
        );
        let result = &evaluation.analyte_results["benzene"];
        assert_eq!(result.status, QCStatus::Fail);
        assert_eq!(result.value, 116.0);
        assert_eq!(evaluation.overall_status(), QCStatus::Fail);
        assert_eq!(evaluation.failures().count(), 1);
    }

    #[test]
    fn test_ten_x_on_tenth_point() {
        let values: Vec<f64> = (1..=10).map(|i| 100.0 + i as f64).collect();
        let points = series("toluene", &values, 100.0, 5.0);
        let policy = QCPolicy::new(10, true).unwrap();
        let evaluation = evaluate_rules(&points, &policy);
        let ten_x: Vec<_> = evaluation
            .rule_hits
            .iter()
            .filter(|h| h.rule == WestgardRule::TenX)
            .map(|h| h.timestamp)
            .collect();
        let expected: Vec<_> = points.iter().map(|p| p.timestamp).collect();
        assert_eq!(ten_x, expected);
        assert_eq!(evaluation.analyte_results["toluene"].flags.len(), 3);
        // only the last point reaches 2 sd
        assert!(rules_hit(&evaluation).contains(&WestgardRule::FourOneS));
        assert!(!rules_hit(&evaluation).contains(&WestgardRule::TwoTwoS));
        assert_eq!(evaluation.analyte_results["toluene"].status, QCStatus::Fail);
    }

    #[test]
    fn test_short_series_only_checks_single_point_rules() {
        let points = series("xylene", &[112.5, 111.0, 112.5], 100.0, 5.0);
        let evaluation = evaluate_rules(&points, &QCPolicy::default());
        assert_eq!(rules_hit(&evaluation), vec![WestgardRule::OneTwoS]);
        let result = &evaluation.analyte_results["xylene"];
        assert_eq!(result.status, QCStatus::Warn);
        assert_eq!(result.flags, vec![WestgardRule::OneTwoS]);

        let history = evaluate_history(&points, &QCPolicy::default());
        assert!(history.rule_hits.iter().all(|h| !h.rule.is_strict()));
    }

    #[test]
    fn test_warning_suppressed_by_policy() {
        let points = series("xylene", &[100.0, 111.0], 100.0, 5.0);
        let policy = QCPolicy::new(6, false).unwrap();
        let evaluation = evaluate_rules(&points, &policy);
        assert_eq!(rules_hit(&evaluation), vec![WestgardRule::OneTwoS]);
        assert_eq!(evaluation.analyte_results["xylene"].status, QCStatus::Pass);
    }

    #[test]
    fn test_two_two_s_marks_both_points() {
        let values = [100.0, 101.0, 99.0, 100.0, 111.0, 112.0];
        let points = series("benzene", &values, 100.0, 5.0);
        let evaluation = evaluate_rules(&points, &QCPolicy::default());
        let two_two: Vec<_> = evaluation
            .rule_hits
            .iter()
            .filter(|h| h.rule == WestgardRule::TwoTwoS)
            .map(|h| (h.timestamp, h.value))
            .collect();
        assert_eq!(
            two_two,
            vec![(points[4].timestamp, 111.0), (points[5].timestamp, 112.0)]
        );
        assert!((evaluation.rule_hits[1].zscore - 2.2).abs() < 1e-9);

        let result = &evaluation.analyte_results["benzene"];
        assert_eq!(
            result.flags,
            vec![WestgardRule::OneTwoS, WestgardRule::TwoTwoS]
        );
        assert_eq!(result.status, QCStatus::Fail);
    }

    #[test]
    fn test_empty_input() {
        let evaluation = evaluate_rules(&[], &QCPolicy::default());
        assert!(evaluation.is_empty());
        assert_eq!(evaluation.overall_status(), QCStatus::Pass);
    }

    #[test]
    fn test_input_order_is_not_trusted() {
        let values = [100.0, 101.0, 99.0, 100.0, 98.0, 111.0, 112.0];
        let points = series("ethylbenzene", &values, 100.0, 5.0);
        let mut shuffled = points.clone();
        shuffled.reverse();
        shuffled.swap(1, 4);

        let ordered = evaluate_rules(&points, &QCPolicy::default());
        let unordered = evaluate_rules(&shuffled, &QCPolicy::default());
        assert_eq!(ordered, unordered);
        assert!(rules_hit(&ordered).contains(&WestgardRule::TwoTwoS));
        assert_eq!(ordered.analyte_results["ethylbenzene"].value, 112.0);
    }

    #[test]
    fn test_range_rule() {
        let values = [100.0, 101.0, 99.0, 100.0, 101.0, 89.0, 111.0];
        let points = series("styrene", &values, 100.0, 5.0);
        let evaluation = evaluate_rules(&points, &QCPolicy::default());
        assert_eq!(
            rules_hit(&evaluation),
            vec![WestgardRule::OneTwoS, WestgardRule::RFourS, WestgardRule::RFourS]
        );
        let range: Vec<_> = evaluation
            .rule_hits
            .iter()
            .filter(|h| h.rule == WestgardRule::RFourS)
            .map(|h| h.value)
            .collect();
        assert_eq!(range, vec![89.0, 111.0]);
        assert_eq!(evaluation.analyte_results["styrene"].status, QCStatus::Fail);
    }

    #[test]
    fn test_four_one_s() {
        let values = [100.0, 99.0, 101.0, 100.0, 106.0, 107.0, 105.5, 106.0];
        let points = series("naphthalene", &values, 100.0, 5.0);
        let evaluation = evaluate_rules(&points, &QCPolicy::default());
        assert_eq!(rules_hit(&evaluation), vec![WestgardRule::FourOneS; 4]);
        assert_eq!(evaluation.rule_hits[0].timestamp, points[4].timestamp);
        assert_eq!(
            evaluation.analyte_results["naphthalene"].status,
            QCStatus::Fail
        );
    }

    #[test]
    fn test_zero_sd_is_on_target() {
        let points = series("methane", &[5.0, 50.0, 500.0], 5.0, 0.0);
        let evaluation = evaluate_rules(&points, &QCPolicy::default());
        assert!(evaluation.rule_hits.is_empty());
        let result = &evaluation.analyte_results["methane"];
        assert_eq!(result.zscore, 0.0);
        assert_eq!(result.status, QCStatus::Pass);
    }

    #[test]
    fn test_analytes_are_independent() {
        let mut points = series("benzene", &[100.0, 100.0, 116.0], 100.0, 5.0);
        points.extend(series("toluene", &[50.0, 51.0, 49.0], 50.0, 2.0));
        let evaluation = evaluate_rules(&points, &QCPolicy::default());
        assert_eq!(evaluation.analyte_results.len(), 2);
        assert_eq!(evaluation.analyte_results["benzene"].status, QCStatus::Fail);
        assert_eq!(evaluation.analyte_results["toluene"].status, QCStatus::Pass);
        assert_eq!(evaluation.hits_for("toluene").count(), 0);
        assert_eq!(evaluation.hits_for("benzene").count(), 2);
    }

    #[test]
    fn test_history_replays_each_point() {
        let values = [100.0, 111.0, 100.0, 99.0, 101.0, 100.0, 117.0];
        let points = series("benzene", &values, 100.0, 5.0);
        let policy = QCPolicy::default();
        let history = evaluate_history(&points, &policy);
        let latest = evaluate_rules(&points, &policy);
        assert_eq!(history.analyte_results, latest.analyte_results);

        let hits: Vec<_> = history
            .rule_hits
            .iter()
            .map(|h| (h.rule, h.timestamp))
            .collect();
        assert_eq!(
            hits,
            vec![
                (WestgardRule::OneTwoS, points[1].timestamp),
                (WestgardRule::OneTwoS, points[6].timestamp),
                (WestgardRule::OneThreeS, points[6].timestamp),
            ]
        );
        assert_eq!(
            rules_hit(&latest),
            vec![WestgardRule::OneTwoS, WestgardRule::OneThreeS]
        );
    }

    #[test]
    fn test_determinism() {
        let values = [100.0, 104.0, 106.0, 108.0, 105.5, 111.0, 89.0, 112.0];
        let points = series("benzene", &values, 100.0, 5.0);
        let policy = QCPolicy::default();
        assert_eq!(evaluate_rules(&points, &policy), evaluate_rules(&points, &policy));
    }
}
