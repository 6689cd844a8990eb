//! Multi-period orchestrator tests.

use safety_insights_core::{
    config::InsightsConfig,
    insights_engine::InsightsEngine,
    metrics::round1,
    store::SafetyStore,
    synthetic::{FeedSpec, SyntheticFeed},
};

fn store() -> SafetyStore {
    let store = SafetyStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn seeded_store(seed: u64, days: u32) -> SafetyStore {
    let store = store();
    SyntheticFeed::generate(&FeedSpec::seeded(seed, days))
        .load_into(&store)
        .expect("load synthetic feed");
    store
}

#[test]
fn empty_tables_never_fail() {
    let store = store();
    let bundle = InsightsEngine::with_defaults(&store)
        .compute_multi_period_insights()
        .expect("multi-period on empty store");

    let keys: Vec<u32> = bundle.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![30, 60, 90]);
    for (_, p) in bundle.iter() {
        assert_eq!(p.insights.total_crimes, 0);
        assert_eq!(p.insights.safety_components.crime_severity_index, 0.0);
        assert_eq!(p.trends.csi_trend, 0.0);
        assert_eq!(p.trends.crime_rate_trend, 0.0);
        assert_eq!(p.trends.daily_crime_rate, 0.0);
    }
}

fn assert_crime_free(store: &SafetyStore) {
    let bundle = InsightsEngine::with_defaults(store)
        .compute_multi_period_insights()
        .expect("multi-period without crimes");
    for (days, p) in bundle.iter() {
        assert_eq!(p.insights.total_crimes, 0, "period {days}");
        assert_eq!(p.insights.safety_components.crime_severity_index, 0.0);
        assert_eq!(p.insights.arrest_rate, 0.0);
        assert_eq!(p.trends.csi_trend, 0.0);
        assert_eq!(p.trends.crime_rate_trend, 0.0);
        assert_eq!(p.trends.daily_crime_rate, 0.0);
    }
}

#[test]
fn arrests_alone_never_fail() {
    let store = store();
    let feed = SyntheticFeed::generate(&FeedSpec::seeded(8, 90));
    assert!(store.insert_arrests(&feed.arrests).unwrap() > 0);
    assert_crime_free(&store);

    let s = InsightsEngine::with_defaults(&store).compute_insights(30).unwrap();
    assert!(s.total_arrests > 0);
    assert_eq!(s.total_calls, 0);
}

#[test]
fn calls_alone_never_fail() {
    let store = store();
    let feed = SyntheticFeed::generate(&FeedSpec::seeded(8, 90));
    assert!(store.insert_calls(&feed.calls).unwrap() > 0);
    assert_crime_free(&store);

    let s = InsightsEngine::with_defaults(&store).compute_insights(30).unwrap();
    assert!(s.total_calls > 0);
    assert_eq!(s.total_arrests, 0);
}

#[test]
fn longer_periods_contain_shorter_ones() {
    let store = seeded_store(42, 120);
    let bundle = InsightsEngine::with_defaults(&store)
        .compute_multi_period_insights()
        .unwrap();

    let p30 = bundle.get(30).unwrap();
    let p60 = bundle.get(60).unwrap();
    let p90 = bundle.get(90).unwrap();

    assert!(p30.insights.total_crimes > 0);
    assert!(p30.insights.total_crimes <= p60.insights.total_crimes);
    assert!(p60.insights.total_crimes <= p90.insights.total_crimes);
    assert!(p30.insights.total_arrests <= p90.insights.total_arrests);

    for (days, p) in bundle.iter() {
        assert_eq!(p.insights.days, *days);
        assert_eq!(
            p.trends.daily_crime_rate,
            round1(p.insights.total_crimes as f64 / f64::from(*days))
        );
        assert_eq!(
            p.trends.daily_arrest_rate,
            round1(p.insights.total_arrests as f64 / f64::from(*days))
        );
    }

    // The longest period reports its own weekly trend.
    assert_eq!(p90.trends.csi_trend, p90.insights.safety_components.recent_trend);
    let expected_30 = (p30.insights.safety_components.crime_severity_index
        - p60.insights.safety_components.crime_severity_index)
        / p60.insights.safety_components.crime_severity_index
        * 100.0;
    assert!((p30.trends.csi_trend - expected_30).abs() < 1e-9);

    // Last-30 rate against the rate over the other 60 days.
    let prior = (p90.insights.total_crimes - p30.insights.total_crimes) as f64 / 60.0;
    let expected_90 = round1((p30.trends.daily_crime_rate - prior) / prior * 100.0);
    assert_eq!(p90.trends.crime_rate_trend, expected_90);
}

#[test]
fn configured_periods_drive_the_bundle() {
    let store = seeded_store(7, 40);
    let config = InsightsConfig { periods: vec![7, 14], ..InsightsConfig::default() };
    let bundle = InsightsEngine::new(&store, config).compute_multi_period_insights().unwrap();

    let keys: Vec<u32> = bundle.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![7, 14]);
}

#[test]
fn bundle_json_is_keyed_by_period_with_flattened_trends() {
    let store = seeded_store(3, 100);
    let bundle = InsightsEngine::with_defaults(&store)
        .compute_multi_period_insights()
        .unwrap();
    let v: serde_json::Value = serde_json::from_str(&bundle.to_json().unwrap()).unwrap();

    for key in ["30", "60", "90"] {
        let period = &v[key];
        assert!(period.is_object(), "missing period {key}");
        for field in ["csi_trend", "daily_crime_rate", "daily_arrest_rate", "crime_rate_trend", "safety_components"] {
            assert!(period.get(field).is_some(), "period {key} missing {field}");
        }
    }
}
