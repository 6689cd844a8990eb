//! Key findings: an ordered rule table evaluated against one snapshot.
//!
//! Each rule is a predicate plus a formatter. Rules run top to bottom and
//! append to their bucket, so within a bucket findings keep table order.

use crate::{
    insights_engine::{InsightSet, TrendingOffense},
    metrics::with_thousands,
    types::Count,
};
use serde::{Deserialize, Serialize};

// ── Thresholds ───────────────────────────────────────────────────────────────

pub const STRONG_ARREST_RATE: f64 = 20.0;
pub const LOW_ARREST_RATE: f64 = 10.0;
pub const TRENDING_SPIKE: f64 = 50.0;
pub const TRENDING_DROP: f64 = -20.0;
/// Only the first N trending offenses produce findings.
pub const TRENDING_SCAN: usize = 10;
pub const LOW_CSI: f64 = 100.0;
pub const HIGH_CSI: f64 = 300.0;
pub const WEEKLY_SPIKE: f64 = 20.0;
pub const WEEKLY_DROP: f64 = -20.0;
pub const LOW_DAILY_RATE: f64 = 300.0;
/// Areas ranked past this many are candidates for the low-activity finding.
pub const MIN_AREAS_FOR_TAIL: usize = 3;
pub const LOW_AREA_TAIL: usize = 3;
pub const LOW_AREA_TOTAL: Count = 500;
pub const LOW_VIOLENT_SHARE: f64 = 15.0;

// ── Types ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Positive,
    Info,
    Warning,
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Improvements,
    Concerns,
    Overview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFindings {
    pub improvements: Vec<Finding>,
    pub concerns:     Vec<Finding>,
    pub overview:     Vec<Finding>,
}

impl KeyFindings {
    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<Finding> {
        match bucket {
            Bucket::Improvements => &mut self.improvements,
            Bucket::Concerns     => &mut self.concerns,
            Bucket::Overview     => &mut self.overview,
        }
    }

    pub fn len(&self) -> usize {
        self.improvements.len() + self.concerns.len() + self.overview.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every finding text, bucket by bucket.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.improvements
            .iter()
            .chain(&self.concerns)
            .chain(&self.overview)
            .map(|f| f.text.as_str())
    }
}

// ── Rule table ───────────────────────────────────────────────────────────────

enum Check {
    /// Fires at most once per snapshot.
    Once {
        when: fn(&InsightSet) -> bool,
        text: fn(&InsightSet) -> String,
    },
    /// Fires once per scanned trending offense whose change passes `when`.
    PerOffense {
        when: fn(f64) -> bool,
        text: fn(&TrendingOffense, f64) -> String,
    },
}

struct FindingRule {
    name:   &'static str,
    bucket: Bucket,
    kind:   FindingKind,
    check:  Check,
}

const RULES: &[FindingRule] = &[
    FindingRule {
        name:   "strong_enforcement",
        bucket: Bucket::Improvements,
        kind:   FindingKind::Positive,
        check:  Check::Once {
            when: |s| s.arrest_rate > STRONG_ARREST_RATE,
            text: |s| format!("Strong law enforcement presence with {:.1}% arrest rate", s.arrest_rate),
        },
    },
    FindingRule {
        name:   "top_area",
        bucket: Bucket::Overview,
        kind:   FindingKind::Info,
        check:  Check::Once {
            when: |s| !s.area_analysis.is_empty(),
            text: |s| {
                let (area, totals) = &s.area_analysis[0];
                format!(
                    "{area} area has highest activity with {} total incidents",
                    with_thousands(totals.total)
                )
            },
        },
    },
    FindingRule {
        name:   "low_arrest_rate",
        bucket: Bucket::Concerns,
        kind:   FindingKind::Warning,
        check:  Check::Once {
            when: |s| s.arrest_rate < LOW_ARREST_RATE,
            text: |s| format!("Low arrest rate ({:.1}%) may indicate enforcement challenges", s.arrest_rate),
        },
    },
    FindingRule {
        name:   "offense_spike",
        bucket: Bucket::Concerns,
        kind:   FindingKind::Alert,
        check:  Check::PerOffense {
            when: |change| change > TRENDING_SPIKE,
            text: |t, change| format!("{} increased {change:.0}% in the last 30 days", t.crime_type),
        },
    },
    FindingRule {
        name:   "offense_drop",
        bucket: Bucket::Improvements,
        kind:   FindingKind::Positive,
        check:  Check::PerOffense {
            when: |change| change < TRENDING_DROP,
            text: |t, change| format!("{} decreased {:.0}% in the last 30 days", t.crime_type, change.abs()),
        },
    },
    FindingRule {
        name:   "low_csi",
        bucket: Bucket::Improvements,
        kind:   FindingKind::Positive,
        check:  Check::Once {
            when: |s| s.safety_components.crime_severity_index < LOW_CSI,
            text: |s| format!(
                "Crime Severity Index of {:.1} indicates relatively low crime impact",
                s.safety_components.crime_severity_index
            ),
        },
    },
    FindingRule {
        name:   "high_csi",
        bucket: Bucket::Concerns,
        kind:   FindingKind::Warning,
        check:  Check::Once {
            when: |s| s.safety_components.crime_severity_index > HIGH_CSI,
            text: |s| format!(
                "Crime Severity Index of {:.1} indicates elevated crime severity",
                s.safety_components.crime_severity_index
            ),
        },
    },
    FindingRule {
        name:   "violent_dominates",
        bucket: Bucket::Concerns,
        kind:   FindingKind::Alert,
        check:  Check::Once {
            when: |s| s.safety_components.violent_csi > s.safety_components.property_csi,
            text: |s| format!(
                "Violent crimes contributing more to severity (Index: {:.1}) than property crimes",
                s.safety_components.violent_csi
            ),
        },
    },
    FindingRule {
        name:   "weekly_spike",
        bucket: Bucket::Concerns,
        kind:   FindingKind::Alert,
        check:  Check::Once {
            when: |s| s.safety_components.recent_trend > WEEKLY_SPIKE,
            text: |s| format!(
                "Crime severity has increased {:.1}% in the past week",
                s.safety_components.recent_trend
            ),
        },
    },
    FindingRule {
        name:   "weekly_drop",
        bucket: Bucket::Improvements,
        kind:   FindingKind::Positive,
        check:  Check::Once {
            when: |s| s.safety_components.recent_trend < WEEKLY_DROP,
            text: |s| format!(
                "Crime severity has decreased {:.1}% in the past week",
                s.safety_components.recent_trend.abs()
            ),
        },
    },
    FindingRule {
        name:   "low_daily_rate",
        bucket: Bucket::Improvements,
        kind:   FindingKind::Positive,
        check:  Check::Once {
            when: |s| s.safety_components.daily_rate < LOW_DAILY_RATE,
            text: |s| format!(
                "Average of {:.0} crimes per day is below major city average",
                s.safety_components.daily_rate
            ),
        },
    },
    FindingRule {
        name:   "quiet_area",
        bucket: Bucket::Improvements,
        kind:   FindingKind::Positive,
        check:  Check::Once {
            when: |s| quiet_area(s).is_some(),
            text: |s| match quiet_area(s) {
                Some((area, total)) => format!("{area} area shows low crime activity with only {total} incidents"),
                None => String::new(),
            },
        },
    },
    FindingRule {
        name:   "low_violent_share",
        bucket: Bucket::Improvements,
        kind:   FindingKind::Positive,
        check:  Check::Once {
            when: |s| s.total_crimes > 0 && violent_share(s) < LOW_VIOLENT_SHARE,
            text: |s| format!("Violent crimes comprise only {:.1}% of total crime", violent_share(s)),
        },
    },
    FindingRule {
        name:   "incident_total",
        bucket: Bucket::Overview,
        kind:   FindingKind::Info,
        check:  Check::Once {
            when: |_| true,
            text: |s| format!(
                "Total of {} incidents reported in analysis period",
                with_thousands(s.total_incidents)
            ),
        },
    },
];

/// First of the lowest-ranked areas under the low-activity threshold.
/// Only considered when more than three areas are ranked.
fn quiet_area(s: &InsightSet) -> Option<(&str, Count)> {
    let areas = &s.area_analysis;
    if areas.len() <= MIN_AREAS_FOR_TAIL {
        return None;
    }
    areas[areas.len() - LOW_AREA_TAIL..]
        .iter()
        .find(|(_, t)| t.total < LOW_AREA_TOTAL)
        .map(|(area, t)| (area.as_str(), t.total))
}

fn violent_share(s: &InsightSet) -> f64 {
    if s.total_crimes > 0 {
        s.violent_crimes as f64 / s.total_crimes as f64 * 100.0
    } else {
        0.0
    }
}

/// Run every rule in order against `insights`.
pub fn generate_key_findings(insights: &InsightSet) -> KeyFindings {
    let mut findings = KeyFindings::default();
    for rule in RULES {
        let out = findings.bucket_mut(rule.bucket);
        let before = out.len();
        match &rule.check {
            Check::Once { when, text } => {
                if when(insights) {
                    out.push(Finding { kind: rule.kind, text: text(insights) });
                }
            }
            Check::PerOffense { when, text } => {
                for offense in insights.trending_crimes.iter().take(TRENDING_SCAN) {
                    // Offenses without a comparison (or with no change) never fire.
                    let Some(change) = offense.change.filter(|c| *c != 0.0) else {
                        continue;
                    };
                    if when(change) {
                        out.push(Finding { kind: rule.kind, text: text(offense, change) });
                    }
                }
            }
        }
        if out.len() > before {
            log::debug!("findings: rule {} fired {}x", rule.name, out.len() - before);
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights_engine::{Anchors, AreaTotals, SafetyComponents};

    fn snapshot() -> InsightSet {
        InsightSet {
            days:              30,
            anchors:           Anchors::default(),
            total_incidents:   0,
            total_crimes:      0,
            total_arrests:     0,
            total_calls:       0,
            violent_crimes:    0,
            arrest_rate:       0.0,
            area_analysis:     Vec::new(),
            hourly_pattern:    Vec::new(),
            high_risk_zips:    Vec::new(),
            trending_crimes:   Vec::new(),
            safety_score:      0.0,
            safety_components: SafetyComponents::default(),
            daily_combined:    Vec::new(),
            key_findings:      KeyFindings::default(),
        }
    }

    fn area(name: &str, total: Count) -> (String, AreaTotals) {
        (name.to_string(), AreaTotals { crimes: total, arrests: 0, calls: 0, total })
    }

    fn trending(name: &str, change: Option<f64>) -> TrendingOffense {
        TrendingOffense {
            crime_type: name.to_string(),
            recent:     20,
            previous:   change.map(|_| 10),
            change,
        }
    }

    #[test]
    fn strong_arrests_and_low_csi_are_improvements_only() {
        let mut s = snapshot();
        s.arrest_rate = 25.0;
        s.safety_components.crime_severity_index = 50.0;
        s.safety_components.daily_rate = 400.0;

        let f = generate_key_findings(&s);
        let texts: Vec<&str> = f.texts().collect();

        assert!(f.improvements.iter().any(|x| x.text.contains("Strong law enforcement presence with 25.0%")));
        assert!(f.improvements.iter().any(|x| x.text.contains("Crime Severity Index of 50.0")));
        assert!(!texts.iter().any(|t| t.contains("Low arrest rate")));
        assert!(!texts.iter().any(|t| t.contains("elevated crime severity")));
        assert!(f.concerns.is_empty(), "unexpected concerns: {:?}", f.concerns);
    }

    #[test]
    fn overview_always_reports_incident_total() {
        let mut s = snapshot();
        s.total_incidents = 12_345;
        let f = generate_key_findings(&s);
        assert_eq!(
            f.overview.last().map(|x| x.text.as_str()),
            Some("Total of 12,345 incidents reported in analysis period")
        );
        assert_eq!(f.overview.last().map(|x| x.kind), Some(FindingKind::Info));
    }

    #[test]
    fn top_area_uses_thousands_separator() {
        let mut s = snapshot();
        s.area_analysis = vec![area("CENTRAL", 1_234), area("NORTH", 10)];
        let f = generate_key_findings(&s);
        assert_eq!(f.overview[0].text, "CENTRAL area has highest activity with 1,234 total incidents");
    }

    #[test]
    fn csi_rules_are_exclusive() {
        let mut s = snapshot();
        s.safety_components.crime_severity_index = 350.0;
        let f = generate_key_findings(&s);
        assert!(f.concerns.iter().any(|x| x.text.contains("elevated crime severity")));
        assert!(!f.improvements.iter().any(|x| x.text.contains("relatively low crime impact")));

        s.safety_components.crime_severity_index = 200.0;
        let f = generate_key_findings(&s);
        assert!(!f.texts().any(|t| t.contains("Crime Severity Index")));
    }

    #[test]
    fn trending_findings_skip_missing_or_zero_change() {
        let mut s = snapshot();
        s.trending_crimes = vec![
            trending("BURGLARY", Some(75.0)),
            trending("THEFT", Some(-40.0)),
            trending("ARSON", None),
            trending("FRAUD", Some(0.0)),
            trending("VANDALISM", Some(10.0)),
        ];
        let f = generate_key_findings(&s);
        assert!(f.concerns.iter().any(|x| x.text == "BURGLARY increased 75% in the last 30 days"));
        assert!(f.improvements.iter().any(|x| x.text == "THEFT decreased 40% in the last 30 days"));
        assert!(!f.texts().any(|t| t.contains("ARSON") || t.contains("FRAUD") || t.contains("VANDALISM")));
    }

    #[test]
    fn only_first_ten_trending_offenses_are_scanned() {
        let mut s = snapshot();
        s.trending_crimes = (0..12).map(|i| trending(&format!("OFFENSE {i:02}"), Some(80.0))).collect();
        let f = generate_key_findings(&s);
        let spikes = f.concerns.iter().filter(|x| x.text.contains("increased")).count();
        assert_eq!(spikes, TRENDING_SCAN);
    }

    #[test]
    fn quiet_area_needs_more_than_three_areas() {
        let mut s = snapshot();
        s.area_analysis = vec![area("A", 900), area("B", 400), area("C", 300)];
        assert!(!generate_key_findings(&s).texts().any(|t| t.contains("low crime activity")));

        s.area_analysis = vec![area("A", 900), area("B", 800), area("C", 450), area("D", 300)];
        let f = generate_key_findings(&s);
        assert!(f.improvements.iter().any(|x| x.text == "C area shows low crime activity with only 450 incidents"));
        assert_eq!(f.texts().filter(|t| t.contains("low crime activity")).count(), 1);
    }

    #[test]
    fn violent_share_needs_crimes() {
        let mut s = snapshot();
        assert!(!generate_key_findings(&s).texts().any(|t| t.contains("Violent crimes comprise")));

        s.total_crimes = 200;
        s.violent_crimes = 20;
        let f = generate_key_findings(&s);
        assert!(f.improvements.iter().any(|x| x.text == "Violent crimes comprise only 10.0% of total crime"));
    }

    #[test]
    fn weekly_trend_rules_use_absolute_value_for_drops() {
        let mut s = snapshot();
        s.safety_components.recent_trend = -32.5;
        let f = generate_key_findings(&s);
        assert!(f.improvements.iter().any(|x| x.text == "Crime severity has decreased 32.5% in the past week"));

        s.safety_components.recent_trend = 21.0;
        let f = generate_key_findings(&s);
        assert!(f.concerns.iter().any(|x| x.text == "Crime severity has increased 21.0% in the past week"));
    }

    #[test]
    fn finding_kind_serializes_as_type() {
        let f = Finding { kind: FindingKind::Alert, text: "x".into() };
        assert_eq!(serde_json::to_string(&f).unwrap(), r#"{"type":"alert","text":"x"}"#);
    }
}
