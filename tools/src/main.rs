//! insights-runner: headless runner for the public-safety insights engine.
//!
//! Usage:
//!   insights-runner --db safety.db --import-crimes crimes.json
//!   insights-runner --db :memory: --synthetic-seed 42 --synthetic-days 120
//!   insights-runner --db safety.db --days 30 --json

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use safety_insights_core::{
    arrest_stats::ArrestStats,
    call_stats::CallStats,
    config::InsightsConfig,
    crime_stats::CrimeStats,
    insights_engine::{InsightSet, InsightsEngine},
    metrics::with_thousands,
    records::{ArrestRecord, CallRecord, CrimeRecord, FetchLogEntry},
    store::{Dataset, SafetyStore},
    synthetic::{FeedSpec, SyntheticFeed},
    types::WindowDays,
};
use serde::de::DeserializeOwned;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let json = args.iter().any(|a| a == "--json");
    let days: Option<WindowDays> = parse_opt(&args, "--days");
    let synthetic_seed: Option<u64> = parse_opt(&args, "--synthetic-seed");
    let synthetic_days = parse_arg(&args, "--synthetic-days", 120u32);

    let config = match flag_value(&args, "--config") {
        Some(path) => InsightsConfig::load(path)?,
        None => InsightsConfig::default(),
    };

    if !json {
        println!("Public-Safety Insights: insights-runner");
        println!("  db:        {db}");
        println!("  periods:   {:?}", config.periods);
        println!("  population {}", with_thousands(config.population as i64));
        println!();
    }

    let store = SafetyStore::open(db)?;
    store.migrate()?;

    if let Some(path) = flag_value(&args, "--import-crimes") {
        let rows: Vec<CrimeRecord> = read_rows(path)?;
        let inserted = store.insert_crimes(&rows)?;
        let dates = rows.iter().map(|r| r.report_date);
        record_fetch(&store, Dataset::Crimes, inserted, dates)?;
        log::info!("imported {inserted}/{} crimes from {path}", rows.len());
    }
    if let Some(path) = flag_value(&args, "--import-arrests") {
        let rows: Vec<ArrestRecord> = read_rows(path)?;
        let inserted = store.insert_arrests(&rows)?;
        let dates = rows.iter().map(|r| r.report_date);
        record_fetch(&store, Dataset::Arrests, inserted, dates)?;
        log::info!("imported {inserted}/{} arrests from {path}", rows.len());
    }
    if let Some(path) = flag_value(&args, "--import-calls") {
        let rows: Vec<CallRecord> = read_rows(path)?;
        let inserted = store.insert_calls(&rows)?;
        let dates = rows.iter().map(|r| r.response_timestamp.date());
        record_fetch(&store, Dataset::Calls, inserted, dates)?;
        log::info!("imported {inserted}/{} calls from {path}", rows.len());
    }
    if let Some(seed) = synthetic_seed {
        let feed = SyntheticFeed::generate(&FeedSpec::seeded(seed, synthetic_days));
        let load = feed.load_into(&store)?;
        if !json {
            println!(
                "Synthetic feed (seed {seed}, {synthetic_days} days): {} crimes, {} arrests, {} calls",
                load.crimes, load.arrests, load.calls
            );
            println!();
        }
    }

    let engine = InsightsEngine::new(&store, config);

    match days {
        Some(days) => {
            let insights = engine.compute_insights(days)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
            } else {
                print_freshness(&store)?;
                print_entity_stats(&store, engine.config(), days)?;
                print_snapshot(&insights);
            }
        }
        None => {
            let bundle = engine.compute_multi_period_insights()?;
            if json {
                println!("{}", bundle.to_json()?);
            } else {
                print_freshness(&store)?;
                for (period, p) in bundle.iter() {
                    print_snapshot(&p.insights);
                    println!(
                        "  trends ({period}d): csi {:+.1}% | crime rate {:+.1}% | {:.1} crimes/day | {:.1} arrests/day",
                        p.trends.csi_trend,
                        p.trends.crime_rate_trend,
                        p.trends.daily_crime_rate,
                        p.trends.daily_arrest_rate
                    );
                    println!();
                }
            }
        }
    }

    Ok(())
}

fn read_rows<T: DeserializeOwned>(path: &str) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("Cannot parse rows in {path}"))
}

fn record_fetch(
    store: &SafetyStore,
    dataset: Dataset,
    inserted: usize,
    dates: impl Iterator<Item = NaiveDate> + Clone,
) -> Result<()> {
    store.log_fetch(&FetchLogEntry {
        fetch_timestamp: Utc::now().naive_utc(),
        dataset: dataset.name().to_string(),
        records_inserted: inserted as i64,
        date_range_start: dates.clone().min(),
        date_range_end: dates.max(),
    })?;
    Ok(())
}

fn print_freshness(store: &SafetyStore) -> Result<()> {
    println!("=== DATA FRESHNESS ===");
    for dataset in Dataset::ALL {
        let f = store.freshness(dataset)?;
        let anchor = f.anchor.map(|d| d.to_string()).unwrap_or_else(|| "(empty)".into());
        let fetched = f
            .last_fetch
            .map(|e| e.fetch_timestamp.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".into());
        println!(
            "  {:<8} rows: {:>9} | latest: {anchor} | last fetch: {fetched}",
            dataset.name(),
            with_thousands(f.row_count)
        );
    }
    println!();
    Ok(())
}

fn print_entity_stats(store: &SafetyStore, config: &InsightsConfig, days: WindowDays) -> Result<()> {
    let crimes = CrimeStats::compute(store, config, days)?;
    let arrests = ArrestStats::compute(store, config, days)?;
    let calls = CallStats::compute(store, config, days)?;

    println!("=== ENTITY STATS ({days}d) ===");
    println!("  crimes:  {} ({} violent)", with_thousands(crimes.total_crimes), crimes.violent_crimes);
    for (label, count) in crimes.crimes_by_type.iter().take(5) {
        println!("    {label:<32} {count:>7}");
    }
    println!("  arrests: {} ({} felony)", with_thousands(arrests.total_arrests), arrests.felony_arrests);
    println!(
        "  calls:   {} ({} emergency, avg response {})",
        with_thousands(calls.total_calls),
        calls.emergency_calls,
        calls
            .avg_response_minutes
            .map(|m| format!("{m:.1} min"))
            .unwrap_or_else(|| "n/a".into())
    );
    println!();
    Ok(())
}

fn print_snapshot(s: &InsightSet) {
    let c = &s.safety_components;
    println!("=== INSIGHTS ({}d) ===", s.days);
    println!("  incidents:      {}", with_thousands(s.total_incidents));
    println!("  crimes:         {}", with_thousands(s.total_crimes));
    println!("  arrests:        {}", with_thousands(s.total_arrests));
    println!("  calls:          {}", with_thousands(s.total_calls));
    println!("  arrest rate:    {:.1}%", s.arrest_rate);
    println!("  safety score:   {:.1}", s.safety_score);
    println!(
        "  CSI:            {:.1} (violent {:.1}, property {:.1}, weekly {:+.1}%)",
        c.crime_severity_index, c.violent_csi, c.property_csi, c.recent_trend
    );
    if let Some((area, totals)) = s.area_analysis.first() {
        println!("  busiest area:   {area} ({})", with_thousands(totals.total));
    }
    for t in s.trending_crimes.iter().take(3) {
        match t.change {
            Some(change) => println!("  trending:       {} {change:+.1}% ({} recent)", t.crime_type, t.recent),
            None => println!("  frequent:       {} ({} recent)", t.crime_type, t.recent),
        }
    }
    for (heading, findings) in [
        ("improvements", &s.key_findings.improvements),
        ("concerns", &s.key_findings.concerns),
        ("overview", &s.key_findings.overview),
    ] {
        if findings.is_empty() {
            continue;
        }
        println!("  {heading}:");
        for f in findings {
            println!("    - {}", f.text);
        }
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    parse_opt(args, flag).unwrap_or(default)
}

fn parse_opt<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    flag_value(args, flag).and_then(|v| v.parse().ok())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
