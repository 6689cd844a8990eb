//! Crime dashboard rollups over one anchored window.

use crate::{
    config::InsightsConfig,
    error::InsightResult,
    store::{Dataset, Dimension, GroupSpec, SafetyStore},
    types::{Count, LabelCount, WindowDays},
    window::Window,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Offense-name fragments counted as violent crime. Matched case-sensitively
/// as substrings of `crime_type`.
pub const VIOLENT_KEYWORDS: [&str; 4] = ["Assault", "Rape", "Robbery", "Homicide"];

pub fn is_violent_offense(crime_type: &str) -> bool {
    VIOLENT_KEYWORDS.iter().any(|k| crime_type.contains(k))
}

/// Violent crimes inside the window.
pub fn violent_crime_count(store: &SafetyStore, window: &Window) -> InsightResult<Count> {
    store.count_matching(Dataset::Crimes, window, Dimension::CrimeType, is_violent_offense)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeStats {
    pub days:               WindowDays,
    pub anchor:             Option<NaiveDate>,
    pub total_crimes:       Count,
    pub crimes_by_type:     Vec<LabelCount>,
    pub crimes_by_category: Vec<LabelCount>,
    pub crimes_by_area:     Vec<LabelCount>,
    pub top_zip_codes:      Vec<LabelCount>,
    pub daily_trend:        Vec<(NaiveDate, Count)>,
    pub violent_crimes:     Count,
}

impl CrimeStats {
    fn empty(days: WindowDays) -> Self {
        Self {
            days,
            anchor:             None,
            total_crimes:       0,
            crimes_by_type:     Vec::new(),
            crimes_by_category: Vec::new(),
            crimes_by_area:     Vec::new(),
            top_zip_codes:      Vec::new(),
            daily_trend:        Vec::new(),
            violent_crimes:     0,
        }
    }

    pub fn compute(store: &SafetyStore, config: &InsightsConfig, days: WindowDays) -> InsightResult<Self> {
        let Some(window) = store.window_for(Dataset::Crimes, days)? else {
            return Ok(Self::empty(days));
        };
        let top = config.breakdown_limit;

        Ok(Self {
            days,
            anchor:             Some(window.anchor),
            total_crimes:       store.count_in(Dataset::Crimes, &window)?,
            crimes_by_type:     store.group_count(Dataset::Crimes, &window, GroupSpec::top(Dimension::CrimeType, top))?,
            crimes_by_category: store.group_count(Dataset::Crimes, &window, GroupSpec::all(Dimension::CrimeAgainst))?,
            crimes_by_area:     store.group_count(Dataset::Crimes, &window, GroupSpec::all(Dimension::ServiceArea))?,
            top_zip_codes:      store.group_count(Dataset::Crimes, &window, GroupSpec::top(Dimension::ZipCode, top))?,
            daily_trend:        store.daily_counts(Dataset::Crimes, &window)?,
            violent_crimes:     violent_crime_count(store, &window)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violent_match_is_case_sensitive_substring() {
        assert!(is_violent_offense("Aggravated Assault"));
        assert!(is_violent_offense("Robbery - Business"));
        assert!(is_violent_offense("Homicide"));
        assert!(!is_violent_offense("AGGRAVATED ASSAULT"));
        assert!(!is_violent_offense("Theft From Building"));
    }
}
