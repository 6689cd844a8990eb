//! Multi-period orchestrator.
//!
//! Computes one snapshot per configured period (30/60/90 by default), each
//! independently, then overlays trend fields that compare each period with
//! the next longer one. The longest period compares its trailing slice
//! against the rest of itself instead.

use crate::{
    error::InsightResult,
    insights_engine::{InsightSet, InsightsEngine},
    metrics::{percent_change, round1},
    types::{Count, WindowDays},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cross-period overlays attached to one period's snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTrends {
    /// CSI % change vs the next longer period. For the longest period, its
    /// own weekly severity trend.
    pub csi_trend:         f64,
    pub daily_crime_rate:  f64,
    pub daily_arrest_rate: f64,
    /// Daily crime rate % change vs the next longer period. For the longest
    /// period, the shortest period's rate vs the rate over the remainder.
    pub crime_rate_trend:  f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodInsights {
    #[serde(flatten)]
    pub insights: InsightSet,
    #[serde(flatten)]
    pub trends:   PeriodTrends,
}

/// Snapshots keyed by period length in days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiPeriodInsights {
    pub periods: BTreeMap<WindowDays, PeriodInsights>,
}

impl MultiPeriodInsights {
    pub fn get(&self, days: WindowDays) -> Option<&PeriodInsights> {
        self.periods.get(&days)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WindowDays, &PeriodInsights)> {
        self.periods.iter()
    }

    pub fn to_json(&self) -> InsightResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn daily_rate(total: Count, days: WindowDays) -> f64 {
    round1(total as f64 / f64::from(days))
}

/// Derive the overlays for snapshots ordered by ascending period.
fn overlay(snapshots: &[InsightSet]) -> Vec<PeriodTrends> {
    let rates: Vec<f64> = snapshots.iter().map(|s| daily_rate(s.total_crimes, s.days)).collect();
    let last = snapshots.len().saturating_sub(1);

    snapshots
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let (csi_trend, crime_rate_trend) = if i < last {
                let longer = &snapshots[i + 1];
                (
                    percent_change(
                        s.safety_components.crime_severity_index,
                        longer.safety_components.crime_severity_index,
                    ),
                    round1(percent_change(rates[i], rates[i + 1])),
                )
            } else {
                (s.safety_components.recent_trend, remainder_rate_trend(snapshots, &rates))
            };
            PeriodTrends {
                csi_trend,
                daily_crime_rate: rates[i],
                daily_arrest_rate: daily_rate(s.total_arrests, s.days),
                crime_rate_trend,
            }
        })
        .collect()
}

/// Shortest period's daily rate vs the daily rate over the rest of the
/// longest period. 0 with fewer than two periods or no remainder crimes.
fn remainder_rate_trend(snapshots: &[InsightSet], rates: &[f64]) -> f64 {
    let (Some(shortest), Some(longest)) = (snapshots.first(), snapshots.last()) else {
        return 0.0;
    };
    if snapshots.len() < 2 || longest.total_crimes <= shortest.total_crimes {
        return 0.0;
    }
    let remainder_days = f64::from(longest.days - shortest.days);
    let prior_rate = (longest.total_crimes - shortest.total_crimes) as f64 / remainder_days;
    round1(percent_change(rates[0], prior_rate))
}

impl InsightsEngine<'_> {
    /// Compute every configured period and the cross-period overlays.
    pub fn compute_multi_period_insights(&self) -> InsightResult<MultiPeriodInsights> {
        let mut periods = self.config().periods.clone();
        periods.sort_unstable();
        periods.dedup();

        let snapshots = periods
            .iter()
            .map(|&days| self.compute_insights(days))
            .collect::<InsightResult<Vec<_>>>()?;
        let trends = overlay(&snapshots);

        log::info!(
            "multi-period: computed {} periods ({:?})",
            snapshots.len(),
            periods
        );
        Ok(MultiPeriodInsights {
            periods: periods
                .into_iter()
                .zip(snapshots.into_iter().zip(trends))
                .map(|(days, (insights, trends))| (days, PeriodInsights { insights, trends }))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights_engine::{Anchors, SafetyComponents};
    use crate::findings::KeyFindings;

    fn snapshot(days: WindowDays, crimes: Count, arrests: Count, csi: f64, trend: f64) -> InsightSet {
        InsightSet {
            days,
            anchors:           Anchors::default(),
            total_incidents:   crimes + arrests,
            total_crimes:      crimes,
            total_arrests:     arrests,
            total_calls:       0,
            violent_crimes:    0,
            arrest_rate:       0.0,
            area_analysis:     Vec::new(),
            hourly_pattern:    Vec::new(),
            high_risk_zips:    Vec::new(),
            trending_crimes:   Vec::new(),
            safety_score:      0.0,
            safety_components: SafetyComponents {
                crime_severity_index: csi,
                recent_trend: trend,
                ..SafetyComponents::default()
            },
            daily_combined:    Vec::new(),
            key_findings:      KeyFindings::default(),
        }
    }

    #[test]
    fn overlays_compare_each_period_with_the_next() {
        let snaps = vec![
            snapshot(30, 300, 60, 120.0, 5.0),
            snapshot(60, 540, 90, 100.0, 3.0),
            snapshot(90, 720, 135, 80.0, -12.5),
        ];
        let t = overlay(&snaps);

        assert!((t[0].csi_trend - 20.0).abs() < 1e-9);
        assert!((t[1].csi_trend - 25.0).abs() < 1e-9);
        assert_eq!(t[2].csi_trend, -12.5);

        assert_eq!(t[0].daily_crime_rate, 10.0);
        assert_eq!(t[1].daily_crime_rate, 9.0);
        assert_eq!(t[2].daily_crime_rate, 8.0);
        assert_eq!(t[0].daily_arrest_rate, 2.0);
        assert_eq!(t[2].daily_arrest_rate, 1.5);

        // 10 vs 9 → 11.1%, 9 vs 8 → 12.5%
        assert_eq!(t[0].crime_rate_trend, 11.1);
        assert_eq!(t[1].crime_rate_trend, 12.5);
        // last-30 rate 10 vs (720 - 300) / 60 = 7 → 42.9%
        assert_eq!(t[2].crime_rate_trend, 42.9);
    }

    #[test]
    fn zero_denominators_give_zero() {
        let snaps = vec![
            snapshot(30, 0, 0, 0.0, 0.0),
            snapshot(60, 0, 0, 0.0, 0.0),
            snapshot(90, 0, 0, 0.0, 0.0),
        ];
        for t in overlay(&snaps) {
            assert_eq!(t, PeriodTrends::default());
        }
    }

    #[test]
    fn remainder_trend_is_zero_when_all_crimes_are_recent() {
        let snaps = vec![snapshot(30, 300, 0, 0.0, 0.0), snapshot(90, 300, 0, 0.0, 0.0)];
        assert_eq!(overlay(&snaps)[1].crime_rate_trend, 0.0);
    }

    #[test]
    fn single_period_has_no_comparisons() {
        let t = overlay(&[snapshot(30, 300, 30, 50.0, 7.0)]);
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].csi_trend, 7.0);
        assert_eq!(t[0].crime_rate_trend, 0.0);
        assert_eq!(t[0].daily_crime_rate, 10.0);
    }
}
