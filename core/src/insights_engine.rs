//! Combined insights engine: one analytical snapshot per window size.
//!
//! Joins the crime, arrest and call tables into cross-cutting metrics:
//!   1. Headline counts and arrest rate
//!   2. Service-area ranking (crimes + arrests)
//!   3. Hourly call pattern
//!   4. High-risk zip scoring
//!   5. Trending offenses (30-day vs prior 30-day)
//!   6. Crime Severity Index, violent/property split, weekly severity trend
//!   7. Display score and daily combined series
//!   8. Key findings (see findings.rs)
//!
//! RULES:
//!   - Each table is windowed on its OWN anchor date. Never share one
//!     "today" across tables; a lagging feed must not truncate the others.
//!   - The engine is read-only and stateless. Every call recomputes from the
//!     store; nothing derived is persisted.
//!   - Every ratio is guarded. An empty store yields an all-zero snapshot.

use crate::{
    config::{DisplayScoreConfig, InsightsConfig},
    crime_stats::violent_crime_count,
    error::{InsightError, InsightResult},
    findings::{generate_key_findings, KeyFindings},
    metrics::{percent_change, percent_of, round1},
    severity::{is_person_offense, weighted_severity},
    store::{Dataset, Dimension, GroupSpec, SafetyStore, SeverityGroup},
    types::{Count, LabelCount, WindowDays},
    window::Window,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ── Public types ─────────────────────────────────────────────────────────────

/// Anchor dates each table was windowed on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchors {
    pub crimes:  Option<NaiveDate>,
    pub arrests: Option<NaiveDate>,
    pub calls:   Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaTotals {
    pub crimes:  Count,
    pub arrests: Count,
    /// Always 0: call service areas are too sparse to rank on.
    pub calls:   Count,
    pub total:   Count,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingOffense {
    #[serde(rename = "type")]
    pub crime_type: String,
    pub recent:     Count,
    /// `None` when there is not enough history to compare.
    pub previous:   Option<Count>,
    /// Percent change, one decimal. `None` when there is not enough history.
    pub change:     Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyComponents {
    pub crime_severity_index: f64,
    pub violent_csi:          f64,
    pub property_csi:         f64,
    /// Last-7-days severity vs the window's expected weekly severity, in %.
    pub recent_trend:         f64,
    pub total_crimes:         Count,
    pub daily_rate:           f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub crimes:  Count,
    pub arrests: Count,
    /// Always 0: calls are not merged into the daily series.
    pub calls:   Count,
}

/// One full analytical snapshot for a single window size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSet {
    pub days:              WindowDays,
    pub anchors:           Anchors,
    pub total_incidents:   Count,
    pub total_crimes:      Count,
    pub total_arrests:     Count,
    pub total_calls:       Count,
    pub violent_crimes:    Count,
    pub arrest_rate:       f64,
    pub area_analysis:     Vec<(String, AreaTotals)>,
    pub hourly_pattern:    Vec<LabelCount>,
    pub high_risk_zips:    Vec<LabelCount>,
    pub trending_crimes:   Vec<TrendingOffense>,
    pub safety_score:      f64,
    pub safety_components: SafetyComponents,
    pub daily_combined:    Vec<(NaiveDate, DailyTotals)>,
    pub key_findings:      KeyFindings,
}

// ── Pure scoring functions ───────────────────────────────────────────────────

/// Weighted severity split by victim category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityTotals {
    pub total:    i64,
    pub violent:  i64,
    pub property: i64,
}

/// Sum weighted severity over (type, category) groups. PERSON offenses count
/// as violent; everything else as property.
pub fn severity_totals(groups: &[SeverityGroup]) -> SeverityTotals {
    let mut totals = SeverityTotals::default();
    for g in groups {
        let weighted = weighted_severity(&g.crime_type, &g.crime_against) * g.count;
        totals.total += weighted;
        if is_person_offense(&g.crime_against) {
            totals.violent += weighted;
        } else {
            totals.property += weighted;
        }
    }
    totals
}

/// Annualized severity-days per 100k residents, scaled down by 100.
pub fn severity_index(weighted: i64, population: f64, days: WindowDays) -> f64 {
    if population <= 0.0 || days == 0 {
        return 0.0;
    }
    weighted as f64 / population * 100_000.0 / f64::from(days) * 365.0 / 100.0
}

/// Compress a CSI onto 0–100 via its log10, mapping the configured log range
/// linearly. CSI ≤ 0 is 0.
pub fn display_score(csi: f64, cfg: &DisplayScoreConfig) -> f64 {
    if csi <= 0.0 || csi.is_nan() {
        return 0.0;
    }
    let log = csi.max(1.0).log10();
    ((log - cfg.log_floor) / (cfg.log_ceiling - cfg.log_floor) * 100.0).clamp(0.0, 100.0)
}

/// Percent change used for trending offenses. A previously unseen offense
/// counts as +100% (or 0% if it is still absent).
pub fn offense_change(recent: Count, previous: Count) -> f64 {
    if previous == 0 {
        if recent > 0 { 100.0 } else { 0.0 }
    } else {
        (recent - previous) as f64 / previous as f64 * 100.0
    }
}

/// Fold `(label, count * weight)` into an insertion-ordered running total.
fn accumulate(
    order:  &mut Vec<(String, Count)>,
    index:  &mut HashMap<String, usize>,
    groups: Vec<LabelCount>,
    weight: Count,
) {
    for (label, count) in groups {
        match index.get(&label) {
            Some(&i) => order[i].1 += count * weight,
            None => {
                index.insert(label.clone(), order.len());
                order.push((label, count * weight));
            }
        }
    }
}

// ── Engine ───────────────────────────────────────────────────────────────────

pub struct InsightsEngine<'a> {
    store:  &'a SafetyStore,
    config: InsightsConfig,
}

impl<'a> InsightsEngine<'a> {
    pub fn new(store: &'a SafetyStore, config: InsightsConfig) -> Self {
        Self { store, config }
    }

    pub fn with_defaults(store: &'a SafetyStore) -> Self {
        Self::new(store, InsightsConfig::default())
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    /// Compute one snapshot over the trailing `days` of each table.
    pub fn compute_insights(&self, days: WindowDays) -> InsightResult<InsightSet> {
        if days == 0 {
            return Err(InsightError::InvalidWindow { days });
        }

        let crime_w  = self.store.window_for(Dataset::Crimes, days)?;
        let arrest_w = self.store.window_for(Dataset::Arrests, days)?;
        let call_w   = self.store.window_for(Dataset::Calls, days)?;

        let total_crimes  = self.count(Dataset::Crimes, crime_w.as_ref())?;
        let total_arrests = self.count(Dataset::Arrests, arrest_w.as_ref())?;
        let total_calls   = self.count(Dataset::Calls, call_w.as_ref())?;
        let violent_crimes = match &crime_w {
            Some(w) => violent_crime_count(self.store, w)?,
            None => 0,
        };

        let arrest_rate = percent_of(total_arrests as f64, total_crimes as f64);

        let (components, safety_score) = match &crime_w {
            Some(w) => self.safety_components(w, total_crimes)?,
            None => (SafetyComponents::default(), 0.0),
        };

        let mut insights = InsightSet {
            days,
            anchors: Anchors {
                crimes:  crime_w.map(|w| w.anchor),
                arrests: arrest_w.map(|w| w.anchor),
                calls:   call_w.map(|w| w.anchor),
            },
            total_incidents: total_crimes + total_arrests,
            total_crimes,
            total_arrests,
            total_calls,
            violent_crimes,
            arrest_rate,
            area_analysis: self.area_analysis(crime_w.as_ref(), arrest_w.as_ref())?,
            hourly_pattern: self.hourly_pattern(call_w.as_ref())?,
            high_risk_zips: self.high_risk_zips(crime_w.as_ref(), arrest_w.as_ref())?,
            trending_crimes: self.trending_offenses(crime_w.map(|w| w.anchor))?,
            safety_score,
            safety_components: components,
            daily_combined: self.daily_combined(crime_w.as_ref(), arrest_w.as_ref())?,
            key_findings: KeyFindings::default(),
        };
        insights.key_findings = generate_key_findings(&insights);

        log::info!(
            "insights: days={days} crimes={total_crimes} arrests={total_arrests} calls={total_calls} csi={:.1} score={:.1}",
            insights.safety_components.crime_severity_index,
            insights.safety_score,
        );
        Ok(insights)
    }

    fn count(&self, dataset: Dataset, window: Option<&Window>) -> InsightResult<Count> {
        match window {
            Some(w) => self.store.count_in(dataset, w),
            None => Ok(0),
        }
    }

    fn groups(
        &self,
        dataset: Dataset,
        window:  Option<&Window>,
        spec:    GroupSpec,
    ) -> InsightResult<Vec<LabelCount>> {
        match window {
            Some(w) => self.store.group_count(dataset, w, spec),
            None => Ok(Vec::new()),
        }
    }

    /// Crimes + arrests per service area, busiest first. Equal totals keep
    /// the order areas were first seen (crime areas, then arrest-only areas).
    fn area_analysis(
        &self,
        crime_w:  Option<&Window>,
        arrest_w: Option<&Window>,
    ) -> InsightResult<Vec<(String, AreaTotals)>> {
        let mut areas: Vec<(String, AreaTotals)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let by_area = GroupSpec::by_label(Dimension::ServiceArea);
        for (dataset, window) in [(Dataset::Crimes, crime_w), (Dataset::Arrests, arrest_w)] {
            for (area, count) in self.groups(dataset, window, by_area)? {
                let i = *index.entry(area.clone()).or_insert_with(|| {
                    areas.push((area, AreaTotals::default()));
                    areas.len() - 1
                });
                match dataset {
                    Dataset::Crimes => areas[i].1.crimes = count,
                    _ => areas[i].1.arrests = count,
                }
            }
        }

        for (_, totals) in &mut areas {
            totals.total = totals.crimes + totals.arrests;
        }
        areas.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        areas.truncate(self.config.area_limit);
        Ok(areas)
    }

    /// Calls per two-digit hour, ascending. Silent hours are absent.
    fn hourly_pattern(&self, call_w: Option<&Window>) -> InsightResult<Vec<LabelCount>> {
        self.groups(Dataset::Calls, call_w, GroupSpec::by_label(Dimension::Hour))
    }

    /// Weighted crime + arrest activity per zip, highest first.
    fn high_risk_zips(
        &self,
        crime_w:  Option<&Window>,
        arrest_w: Option<&Window>,
    ) -> InsightResult<Vec<LabelCount>> {
        let by_zip = GroupSpec::by_label(Dimension::ZipCode);
        let weights = &self.config.zip_risk;

        let mut scores: Vec<(String, Count)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        accumulate(
            &mut scores,
            &mut index,
            self.groups(Dataset::Crimes, crime_w, by_zip)?,
            weights.crime_weight,
        );
        accumulate(
            &mut scores,
            &mut index,
            self.groups(Dataset::Arrests, arrest_w, by_zip)?,
            weights.arrest_weight,
        );

        scores.sort_by(|a, b| b.1.cmp(&a.1));
        scores.truncate(weights.limit);
        Ok(scores)
    }

    /// Offenses moving the most between the last two comparison windows.
    ///
    /// With too little history to compare, lists the most frequent offenses
    /// instead and leaves `previous`/`change` as `None`.
    fn trending_offenses(&self, anchor: Option<NaiveDate>) -> InsightResult<Vec<TrendingOffense>> {
        let Some(anchor) = anchor else {
            return Ok(Vec::new());
        };
        let cfg = &self.config.trending;
        let by_type = GroupSpec::all(Dimension::CrimeType);
        let history = self.store.distinct_dates_through(Dataset::Crimes, anchor)?;

        if history < cfg.min_history_days {
            log::debug!(
                "insights: {history} days of crime history, below {}, listing top offenses",
                cfg.min_history_days
            );
            // Fallback span is one day short of the available history.
            if history <= 1 {
                return Ok(Vec::new());
            }
            let span = ((history - 1) as WindowDays).min(cfg.comparison_days.saturating_sub(1));
            if span == 0 {
                return Ok(Vec::new());
            }
            let window = Window::ending_at(anchor, span);
            let mut top: Vec<TrendingOffense> = self
                .store
                .group_count(Dataset::Crimes, &window, by_type)?
                .into_iter()
                .filter(|(_, count)| *count >= cfg.min_recent_count)
                .map(|(crime_type, recent)| TrendingOffense {
                    crime_type,
                    recent,
                    previous: None,
                    change: None,
                })
                .collect();
            top.truncate(cfg.limit);
            return Ok(top);
        }

        let recent_w = Window::ending_at(anchor, cfg.comparison_days);
        let previous_w = recent_w.preceding();
        let previous: HashMap<String, Count> = self
            .store
            .group_count(Dataset::Crimes, &previous_w, by_type)?
            .into_iter()
            .collect();

        let mut moves: Vec<(f64, TrendingOffense)> = self
            .store
            .group_count(Dataset::Crimes, &recent_w, by_type)?
            .into_iter()
            .filter(|(_, recent)| *recent >= cfg.min_recent_count)
            .map(|(crime_type, recent)| {
                let prev = previous.get(&crime_type).copied().unwrap_or(0);
                let change = offense_change(recent, prev);
                (
                    change,
                    TrendingOffense {
                        crime_type,
                        recent,
                        previous: Some(prev),
                        change: Some(round1(change)),
                    },
                )
            })
            .collect();

        moves.sort_by(|(a_change, a), (b_change, b)| {
            b_change
                .abs()
                .total_cmp(&a_change.abs())
                .then_with(|| a.crime_type.cmp(&b.crime_type))
        });
        moves.truncate(cfg.limit);
        Ok(moves.into_iter().map(|(_, t)| t).collect())
    }

    /// CSI family, weekly trend and display score for the crime window.
    fn safety_components(
        &self,
        window:       &Window,
        total_crimes: Count,
    ) -> InsightResult<(SafetyComponents, f64)> {
        let population = self.config.population;
        let days = window.days;
        let totals = severity_totals(&self.store.severity_groups(window)?);

        let csi = severity_index(totals.total, population, days);
        let violent_csi = severity_index(totals.violent, population, days);
        let property_csi = severity_index(totals.property, population, days);
        let recent_trend = self.recent_severity_trend(window)?;

        let components = SafetyComponents {
            crime_severity_index: round1(csi),
            violent_csi:          round1(violent_csi),
            property_csi:         round1(property_csi),
            recent_trend:         round1(recent_trend),
            total_crimes,
            daily_rate:           round1(total_crimes as f64 / f64::from(days)),
        };
        let score = round1(display_score(csi, &self.config.display_score));
        Ok((components, score))
    }

    /// Severity of the trailing week against the week-equivalent of the rest
    /// of the window. 0 when there is no earlier severity to compare with.
    fn recent_severity_trend(&self, window: &Window) -> InsightResult<f64> {
        let n = self.config.severity_trend_days;
        let Some(earlier) = window.before_trailing(n) else {
            return Ok(0.0);
        };

        let recent = severity_totals(&self.store.severity_groups(&window.trailing(n))?).total;
        let prior = severity_totals(&self.store.severity_groups(&earlier)?).total;
        if prior <= 0 {
            return Ok(0.0);
        }

        let expected = prior as f64 / f64::from(earlier.days) * f64::from(n);
        Ok(percent_change(recent as f64, expected))
    }

    /// Per-date crimes and arrests, ascending; dates in neither are absent.
    fn daily_combined(
        &self,
        crime_w:  Option<&Window>,
        arrest_w: Option<&Window>,
    ) -> InsightResult<Vec<(NaiveDate, DailyTotals)>> {
        let mut days: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
        if let Some(w) = crime_w {
            for (date, count) in self.store.daily_counts(Dataset::Crimes, w)? {
                days.entry(date).or_default().crimes = count;
            }
        }
        if let Some(w) = arrest_w {
            for (date, count) in self.store.daily_counts(Dataset::Arrests, w)? {
                days.entry(date).or_default().arrests = count;
            }
        }
        Ok(days.into_iter().collect())
    }
}
