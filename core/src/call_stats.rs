//! Calls-for-service dashboard rollups over one anchored window.

use crate::{
    config::InsightsConfig,
    error::InsightResult,
    metrics::round1,
    store::{Dataset, Dimension, GroupSpec, SafetyStore},
    types::{Count, LabelCount, WindowDays},
    window::Window,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const EMERGENCY_CALL_TYPE: &str = "Emergency";

pub fn emergency_call_count(store: &SafetyStore, window: &Window) -> InsightResult<Count> {
    store.count_matching(Dataset::Calls, window, Dimension::CallType, |t| {
        t == EMERGENCY_CALL_TYPE
    })
}

/// Mean response time in minutes, one decimal. `None` without timed calls.
pub fn avg_response_minutes(store: &SafetyStore, window: &Window) -> InsightResult<Option<f64>> {
    Ok(store
        .mean_response_seconds(window)?
        .map(|secs| round1(secs / 60.0)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStats {
    pub days:                 WindowDays,
    pub anchor:               Option<NaiveDate>,
    pub total_calls:          Count,
    pub calls_by_problem:     Vec<LabelCount>,
    /// Ordered by priority label, not by count.
    pub calls_by_priority:    Vec<LabelCount>,
    pub calls_by_type:        Vec<LabelCount>,
    pub calls_by_area:        Vec<LabelCount>,
    pub top_zip_codes:        Vec<LabelCount>,
    pub daily_trend:          Vec<(NaiveDate, Count)>,
    pub emergency_calls:      Count,
    pub avg_response_minutes: Option<f64>,
    pub calls_by_disposition: Vec<LabelCount>,
}

impl CallStats {
    fn empty(days: WindowDays) -> Self {
        Self {
            days,
            anchor:               None,
            total_calls:          0,
            calls_by_problem:     Vec::new(),
            calls_by_priority:    Vec::new(),
            calls_by_type:        Vec::new(),
            calls_by_area:        Vec::new(),
            top_zip_codes:        Vec::new(),
            daily_trend:          Vec::new(),
            emergency_calls:      0,
            avg_response_minutes: None,
            calls_by_disposition: Vec::new(),
        }
    }

    pub fn compute(store: &SafetyStore, config: &InsightsConfig, days: WindowDays) -> InsightResult<Self> {
        let Some(window) = store.window_for(Dataset::Calls, days)? else {
            return Ok(Self::empty(days));
        };
        let top = config.breakdown_limit;
        let dispositions = GroupSpec::top(Dimension::DispositionType, config.disposition_limit).non_blank();

        Ok(Self {
            days,
            anchor:               Some(window.anchor),
            total_calls:          store.count_in(Dataset::Calls, &window)?,
            calls_by_problem:     store.group_count(Dataset::Calls, &window, GroupSpec::top(Dimension::Problem, top))?,
            calls_by_priority:    store.group_count(Dataset::Calls, &window, GroupSpec::by_label(Dimension::Priority))?,
            calls_by_type:        store.group_count(Dataset::Calls, &window, GroupSpec::all(Dimension::CallType))?,
            calls_by_area:        store.group_count(Dataset::Calls, &window, GroupSpec::all(Dimension::ServiceArea))?,
            top_zip_codes:        store.group_count(Dataset::Calls, &window, GroupSpec::top(Dimension::ZipCode, top))?,
            daily_trend:          store.daily_counts(Dataset::Calls, &window)?,
            emergency_calls:      emergency_call_count(store, &window)?,
            avg_response_minutes: avg_response_minutes(store, &window)?,
            calls_by_disposition: store.group_count(Dataset::Calls, &window, dispositions)?,
        })
    }
}
