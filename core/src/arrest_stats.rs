//! Arrest dashboard rollups over one anchored window.

use crate::{
    config::InsightsConfig,
    error::InsightResult,
    store::{Dataset, Dimension, GroupSpec, SafetyStore},
    types::{Count, LabelCount, WindowDays},
    window::Window,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const FELONY_MARKER: &str = "Felony";

/// Arrests whose free-text severity mentions a felony.
pub fn felony_arrest_count(store: &SafetyStore, window: &Window) -> InsightResult<Count> {
    store.count_matching(Dataset::Arrests, window, Dimension::Severity, |s| {
        s.contains(FELONY_MARKER)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrestStats {
    pub days:                WindowDays,
    pub anchor:              Option<NaiveDate>,
    pub total_arrests:       Count,
    pub arrests_by_offense:  Vec<LabelCount>,
    pub arrests_by_severity: Vec<LabelCount>,
    pub arrests_by_area:     Vec<LabelCount>,
    pub top_zip_codes:       Vec<LabelCount>,
    pub daily_trend:         Vec<(NaiveDate, Count)>,
    pub felony_arrests:      Count,
}

impl ArrestStats {
    fn empty(days: WindowDays) -> Self {
        Self {
            days,
            anchor:              None,
            total_arrests:       0,
            arrests_by_offense:  Vec::new(),
            arrests_by_severity: Vec::new(),
            arrests_by_area:     Vec::new(),
            top_zip_codes:       Vec::new(),
            daily_trend:         Vec::new(),
            felony_arrests:      0,
        }
    }

    pub fn compute(store: &SafetyStore, config: &InsightsConfig, days: WindowDays) -> InsightResult<Self> {
        let Some(window) = store.window_for(Dataset::Arrests, days)? else {
            return Ok(Self::empty(days));
        };
        let top = config.breakdown_limit;

        Ok(Self {
            days,
            anchor:              Some(window.anchor),
            total_arrests:       store.count_in(Dataset::Arrests, &window)?,
            arrests_by_offense:  store.group_count(Dataset::Arrests, &window, GroupSpec::top(Dimension::Offense, top))?,
            arrests_by_severity: store.group_count(Dataset::Arrests, &window, GroupSpec::all(Dimension::Severity))?,
            arrests_by_area:     store.group_count(Dataset::Arrests, &window, GroupSpec::all(Dimension::ServiceArea))?,
            top_zip_codes:       store.group_count(Dataset::Arrests, &window, GroupSpec::top(Dimension::ZipCode, top))?,
            daily_trend:         store.daily_counts(Dataset::Arrests, &window)?,
            felony_arrests:      felony_arrest_count(store, &window)?,
        })
    }
}
