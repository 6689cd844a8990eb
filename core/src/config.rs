//! Insights configuration.
//!
//! The defaults are the policy constants of the published safety analysis
//! (population, window sizes, ranking depths, noise floors). They are named
//! here so they are visible and reviewable in one place, not so they can be
//! tuned per deployment; changing any of them changes historical outputs.

use crate::types::WindowDays;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZipRiskConfig {
    /// Score contributed by each crime report in a zip.
    pub crime_weight: i64,
    /// Score contributed by each arrest in a zip.
    pub arrest_weight: i64,
    pub limit: usize,
}

impl Default for ZipRiskConfig {
    fn default() -> Self {
        Self { crime_weight: 3, arrest_weight: 2, limit: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    /// Length of each compared sub-window.
    pub comparison_days: WindowDays,
    /// Distinct report dates required before comparing sub-windows.
    pub min_history_days: i64,
    /// Offenses with fewer recent reports are treated as noise.
    pub min_recent_count: i64,
    pub limit: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            comparison_days:  30,
            min_history_days: 60,
            min_recent_count: 10,
            limit:            10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayScoreConfig {
    /// log10(CSI) mapped to 0.
    pub log_floor: f64,
    /// log10(CSI) mapped to 100.
    pub log_ceiling: f64,
}

impl Default for DisplayScoreConfig {
    fn default() -> Self {
        Self { log_floor: 2.0, log_ceiling: 5.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Population used to normalize the CSI per 100k residents.
    pub population: f64,
    /// Window sizes computed by the multi-period orchestrator, ascending.
    pub periods: Vec<WindowDays>,
    /// Depth of "top N" breakdowns in the per-entity stats.
    pub breakdown_limit: usize,
    pub disposition_limit: usize,
    pub area_limit: usize,
    /// Trailing days compared against the rest of the window for the
    /// recent severity trend.
    pub severity_trend_days: WindowDays,
    pub zip_risk: ZipRiskConfig,
    pub trending: TrendingConfig,
    pub display_score: DisplayScoreConfig,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            population:          1_500_000.0,
            periods:             vec![30, 60, 90],
            breakdown_limit:     10,
            disposition_limit:   5,
            area_limit:          7,
            severity_trend_days: 7,
            zip_risk:            ZipRiskConfig::default(),
            trending:            TrendingConfig::default(),
            display_score:       DisplayScoreConfig::default(),
        }
    }
}

impl InsightsConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: InsightsConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.population <= 0.0 {
            anyhow::bail!("population must be positive, got {}", self.population);
        }
        if self.periods.is_empty() {
            anyhow::bail!("at least one period is required");
        }
        if self.periods.iter().any(|p| *p == 0) {
            anyhow::bail!("periods must be at least 1 day: {:?}", self.periods);
        }
        if self.periods.windows(2).any(|w| w[0] >= w[1]) {
            anyhow::bail!("periods must be strictly ascending: {:?}", self.periods);
        }
        if self.display_score.log_ceiling <= self.display_score.log_floor {
            anyhow::bail!("display score log range is empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy_constants() {
        let c = InsightsConfig::default();
        assert_eq!(c.population, 1_500_000.0);
        assert_eq!(c.periods, vec![30, 60, 90]);
        assert_eq!(c.area_limit, 7);
        assert_eq!(c.zip_risk.crime_weight, 3);
        assert_eq!(c.zip_risk.arrest_weight, 2);
        assert_eq!(c.trending.min_history_days, 60);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: InsightsConfig = serde_json::from_str(r#"{ "population": 2000000 }"#).unwrap();
        assert_eq!(c.population, 2_000_000.0);
        assert_eq!(c.periods, vec![30, 60, 90]);
        assert_eq!(c.trending.comparison_days, 30);
    }

    #[test]
    fn unordered_periods_are_rejected() {
        let c = InsightsConfig { periods: vec![60, 30], ..InsightsConfig::default() };
        assert!(c.validate().is_err());
    }
}
