//! Deterministic synthetic feed of normalized crime, arrest and call rows.
//!
//! Stands in for the upstream ingestion producer in demos and tests. Same
//! [`FeedSpec`] gives the same rows, down to the report ids.
//!
//! Arrests and calls lag the crime feed by a day or two, as real feeds do,
//! so every snapshot exercises the per-table anchors.

use crate::{
    error::InsightResult,
    records::{ArrestRecord, CallRecord, CrimeRecord, FetchLogEntry},
    rng::{FeedRng, RngBank, StreamSlot},
    store::{Dataset, SafetyStore},
    types::UNKNOWN_ZIP,
};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

// ── Catalogs ─────────────────────────────────────────────────────────────────

/// (crime_type, crime_against, nibrs_group), relative frequency.
const OFFENSES: &[((&str, &str, &str), u32)] = &[
    (("Simple Assault", "PERSON", "ASSAULT OFFENSES"), 14),
    (("Aggravated Assault", "PERSON", "ASSAULT OFFENSES"), 6),
    (("Intimidation", "PERSON", "ASSAULT OFFENSES"), 3),
    (("Robbery", "PROPERTY", "ROBBERY"), 4),
    (("Burglary of Habitation", "PROPERTY", "BURGLARY/ BREAKING & ENTERING"), 7),
    (("Burglary of Vehicle", "PROPERTY", "LARCENY/ THEFT OFFENSES"), 12),
    (("Theft", "PROPERTY", "LARCENY/ THEFT OFFENSES"), 16),
    (("Shoplifting", "PROPERTY", "LARCENY/ THEFT OFFENSES"), 8),
    (("Auto Theft", "PROPERTY", "MOTOR VEHICLE THEFT"), 9),
    (("Vandalism", "PROPERTY", "DESTRUCTION/ DAMAGE/ VANDALISM OF PROPERTY"), 10),
    (("Credit Card Fraud", "PROPERTY", "FRAUD OFFENSES"), 4),
    (("Drug Possession", "SOCIETY", "DRUG/ NARCOTIC VIOLATIONS"), 5),
    (("Weapon Law Violations", "SOCIETY", "WEAPON LAW VIOLATIONS"), 2),
];

/// (offense, severity), relative frequency.
const ARREST_OFFENSES: &[((&str, &str), u32)] = &[
    (("ASSAULT", "Misdemeanor A"), 10),
    (("AGGRAVATED ASSAULT", "Felony 2nd Degree"), 4),
    (("THEFT", "Misdemeanor B"), 8),
    (("BURGLARY OF HABITATION", "Felony 2nd Degree"), 3),
    (("ROBBERY", "Felony 2nd Degree"), 2),
    (("DRUG POSSESSION", "Felony State Jail"), 7),
    (("DWI", "Misdemeanor B"), 5),
    (("PUBLIC INTOXICATION", "Class C"), 4),
    (("EVADING ARREST", "Misdemeanor A"), 3),
];

/// problem, relative frequency.
const PROBLEMS: &[(&str, u32)] = &[
    ("Disturbance", 12),
    ("Suspicious Person", 9),
    ("Major Disturbance (Violence)", 5),
    ("Burglary Call", 4),
    ("Crisis Intervention", 3),
    ("Traffic Accident", 8),
    ("Alarm", 7),
    ("Loud Music", 4),
    ("Other", 6),
];

const SERVICE_AREAS: &[&str] = &[
    "Central",
    "North Central",
    "Northeast",
    "Northwest",
    "South Central",
    "Southeast",
    "Southwest",
];

const ZIP_CODES: &[&str] = &[
    "75201", "75203", "75204", "75206", "75208", "75211",
    "75215", "75216", "75217", "75220", "75228", "75243",
];

const OUT_OF_AREA_ZIP: &str = "Out of City";

const DISPOSITIONS: &[(&str, u32)] = &[
    ("Report Written", 8),
    ("Advised", 6),
    ("Unable to Locate", 4),
    ("Arrest Made", 2),
    ("Cleared", 5),
    ("", 1),
];

/// Hour of day, relative frequency. Evenings are busiest.
const HOUR_WEIGHTS: [u32; 24] = [
    5, 4, 3, 2, 2, 2, 3, 4, 5, 6, 6, 7,
    7, 7, 7, 8, 8, 9, 10, 10, 9, 8, 7, 6,
];

// ── Feed parameters ───────────────────────────────────────────────────────────────

pub const ARREST_LAG_DAYS: i64 = 2;
pub const CALL_LAG_DAYS: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSpec {
    pub seed:            u64,
    /// Days of history generated for the crime feed.
    pub days:            u32,
    /// Latest crime report date.
    pub anchor:          NaiveDate,
    pub crimes_per_day:  f64,
    pub arrests_per_day: f64,
    pub calls_per_day:   f64,
    /// Daily growth in volume toward the anchor (0.002 = +0.2%/day).
    pub drift:           f64,
}

impl Default for FeedSpec {
    fn default() -> Self {
        Self {
            seed:            42,
            days:            120,
            anchor:          NaiveDate::from_ymd_opt(2025, 6, 30).unwrap_or_default(),
            crimes_per_day:  40.0,
            arrests_per_day: 9.0,
            calls_per_day:   60.0,
            drift:           0.002,
        }
    }
}

impl FeedSpec {
    pub fn seeded(seed: u64, days: u32) -> Self {
        Self { seed, days, ..Self::default() }
    }
}

/// Expected rows for one day: base volume, weekend bump, drift and jitter.
fn daily_volume(rng: &mut FeedRng, base: f64, date: NaiveDate, days_before_anchor: i64, drift: f64) -> usize {
    let weekday = match date.weekday() {
        Weekday::Fri | Weekday::Sat => 1.15,
        Weekday::Sun                => 0.9,
        _                           => 1.0,
    };
    let growth = (1.0 + drift).powf(-(days_before_anchor as f64));
    let jitter = 0.85 + 0.3 * rng.next_f64();
    (base * weekday * growth * jitter).round().max(0.0) as usize
}

fn random_zip(rng: &mut FeedRng) -> String {
    if rng.chance(0.03) {
        UNKNOWN_ZIP.to_string()
    } else if rng.chance(0.01) {
        OUT_OF_AREA_ZIP.to_string()
    } else {
        rng.pick(ZIP_CODES).to_string()
    }
}

fn random_time(rng: &mut FeedRng) -> NaiveTime {
    let weighted: Vec<(u32, u32)> = (0u32..24).zip(HOUR_WEIGHTS).collect();
    let hour = *rng.pick_weighted(&weighted);
    let minute = rng.next_u64_below(60) as u32;
    let second = rng.next_u64_below(60) as u32;
    NaiveTime::from_hms_opt(hour, minute, second).unwrap_or_default()
}

// ── Feed ─────────────────────────────────────────────────────────────────────

/// Rows inserted per dataset by [`SyntheticFeed::load_into`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedLoad {
    pub crimes:  usize,
    pub arrests: usize,
    pub calls:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticFeed {
    pub spec:    FeedSpec,
    pub crimes:  Vec<CrimeRecord>,
    pub arrests: Vec<ArrestRecord>,
    pub calls:   Vec<CallRecord>,
}

impl SyntheticFeed {
    pub fn generate(spec: &FeedSpec) -> Self {
        let bank = RngBank::new(spec.seed);
        let feed = Self {
            spec:    spec.clone(),
            crimes:  Self::crimes(spec, &mut bank.for_stream(StreamSlot::Crimes)),
            arrests: Self::arrests(spec, &mut bank.for_stream(StreamSlot::Arrests)),
            calls:   Self::calls(spec, &mut bank.for_stream(StreamSlot::Calls)),
        };
        log::debug!(
            "synthetic: seed={} days={} crimes={} arrests={} calls={}",
            spec.seed,
            spec.days,
            feed.crimes.len(),
            feed.arrests.len(),
            feed.calls.len()
        );
        feed
    }

    /// Dates of one feed, oldest first, ending `lag` days before the anchor.
    fn dates(spec: &FeedSpec, lag: i64) -> impl Iterator<Item = (i64, NaiveDate)> + '_ {
        (lag..i64::from(spec.days)).rev().map(move |back| (back, spec.anchor - Duration::days(back)))
    }

    fn crimes(spec: &FeedSpec, rng: &mut FeedRng) -> Vec<CrimeRecord> {
        let mut rows = Vec::new();
        for (back, date) in Self::dates(spec, 0) {
            for _ in 0..daily_volume(rng, spec.crimes_per_day, date, back, spec.drift) {
                let (crime_type, against, group) = *rng.pick_weighted(OFFENSES);
                let occurred = date - Duration::days(rng.next_u64_below(3) as i64);
                rows.push(CrimeRecord {
                    report_id:     rng.next_uuid().to_string(),
                    report_date:   date,
                    crime_type:    crime_type.to_string(),
                    crime_against: against.to_string(),
                    service_area:  rng.pick(SERVICE_AREAS).to_string(),
                    zip_code:      random_zip(rng),
                    nibrs_group:   group.to_string(),
                    occurred_at:   Some(occurred.and_time(random_time(rng))),
                });
            }
        }
        rows
    }

    fn arrests(spec: &FeedSpec, rng: &mut FeedRng) -> Vec<ArrestRecord> {
        let mut rows = Vec::new();
        for (back, date) in Self::dates(spec, ARREST_LAG_DAYS) {
            for _ in 0..daily_volume(rng, spec.arrests_per_day, date, back, spec.drift) {
                let (offense, severity) = *rng.pick_weighted(ARREST_OFFENSES);
                rows.push(ArrestRecord {
                    report_id:    rng.next_uuid().to_string(),
                    report_date:  date,
                    person_id:    format!("P{:07}", rng.next_u64_below(10_000_000)),
                    offense:      offense.to_string(),
                    severity:     severity.to_string(),
                    service_area: rng.pick(SERVICE_AREAS).to_string(),
                    zip_code:     random_zip(rng),
                    report_month: date.format("%B").to_string(),
                });
            }
        }
        rows
    }

    fn calls(spec: &FeedSpec, rng: &mut FeedRng) -> Vec<CallRecord> {
        let mut rows = Vec::new();
        let mut sequence = 0u32;
        for (back, date) in Self::dates(spec, CALL_LAG_DAYS) {
            for _ in 0..daily_volume(rng, spec.calls_per_day, date, back, spec.drift) {
                sequence += 1;
                let emergency = rng.chance(0.4);
                let priority = if emergency { 1 + rng.next_u64_below(2) } else { 2 + rng.next_u64_below(3) };
                let response = if rng.chance(0.05) {
                    None
                } else {
                    Some(rng.pareto(180.0, 1.8).min(7_200.0).round() as i64)
                };
                rows.push(CallRecord {
                    incident_number:    format!("{}-{sequence:06}", date.format("%y")),
                    response_timestamp: date.and_time(random_time(rng)),
                    priority:           priority.to_string(),
                    problem:            rng.pick_weighted(PROBLEMS).to_string(),
                    call_type:          if emergency { "Emergency" } else { "Non-Emergency" }.to_string(),
                    service_area:       rng.pick(SERVICE_AREAS).to_string(),
                    postal_code:        random_zip(rng),
                    response_seconds:   response,
                    disposition_type:   rng.pick_weighted(DISPOSITIONS).to_string(),
                    weekday:            date.format("%A").to_string(),
                });
            }
        }
        rows
    }

    /// Insert every row and record one fetch-log entry per dataset.
    pub fn load_into(&self, store: &SafetyStore) -> InsightResult<FeedLoad> {
        let load = FeedLoad {
            crimes:  store.insert_crimes(&self.crimes)?,
            arrests: store.insert_arrests(&self.arrests)?,
            calls:   store.insert_calls(&self.calls)?,
        };

        let fetched_at = (self.spec.anchor + Duration::days(1)).and_time(NaiveTime::default());
        let ranges = [
            (Dataset::Crimes, load.crimes, self.crimes.first().map(|r| r.report_date), self.crimes.last().map(|r| r.report_date)),
            (Dataset::Arrests, load.arrests, self.arrests.first().map(|r| r.report_date), self.arrests.last().map(|r| r.report_date)),
            (
                Dataset::Calls,
                load.calls,
                self.calls.first().map(|r| r.response_timestamp.date()),
                self.calls.last().map(|r| r.response_timestamp.date()),
            ),
        ];
        for (dataset, inserted, start, end) in ranges {
            store.log_fetch(&FetchLogEntry {
                fetch_timestamp:  fetched_at,
                dataset:          dataset.name().to_string(),
                records_inserted: inserted as i64,
                date_range_start: start,
                date_range_end:   end,
            })?;
        }

        log::info!(
            "synthetic: loaded crimes={} arrests={} calls={}",
            load.crimes,
            load.arrests,
            load.calls
        );
        Ok(load)
    }
}
