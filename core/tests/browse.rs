//! Record browsing and data freshness tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use safety_insights_core::{
    records::{ArrestRecord, CallRecord, CrimeRecord, FetchLogEntry},
    store::{Dataset, Dimension, RecordFilter, SafetyStore},
    synthetic::{FeedSpec, SyntheticFeed},
};

fn store() -> SafetyStore {
    let store = SafetyStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn crime(id: &str, date: NaiveDate, crime_type: &str, area: &str, zip: &str) -> CrimeRecord {
    CrimeRecord {
        report_id:     id.to_string(),
        report_date:   date,
        crime_type:    crime_type.to_string(),
        crime_against: "PROPERTY".to_string(),
        service_area:  area.to_string(),
        zip_code:      zip.to_string(),
        nibrs_group:   "LARCENY/ THEFT OFFENSES".to_string(),
        occurred_at:   None,
    }
}

fn arrest(id: &str, date: NaiveDate, offense: &str, area: &str) -> ArrestRecord {
    ArrestRecord {
        report_id:    id.to_string(),
        report_date:  date,
        person_id:    format!("P-{id}"),
        offense:      offense.to_string(),
        severity:     "Misdemeanor A".to_string(),
        service_area: area.to_string(),
        zip_code:     "75204".to_string(),
        report_month: "June".to_string(),
    }
}

fn call(id: &str, ts: NaiveDateTime, problem: &str, seconds: Option<i64>) -> CallRecord {
    CallRecord {
        incident_number:    id.to_string(),
        response_timestamp: ts,
        priority:           "2".to_string(),
        problem:            problem.to_string(),
        call_type:          "Non-Emergency".to_string(),
        service_area:       "Central".to_string(),
        postal_code:        "75201".to_string(),
        response_seconds:   seconds,
        disposition_type:   "Advised".to_string(),
        weekday:            "Sunday".to_string(),
    }
}

/// 25 crimes, one per day from 2025-06-01, alternating areas.
fn seed_crimes(store: &SafetyStore) {
    let rows: Vec<CrimeRecord> = (0..25)
        .map(|i| {
            let area = if i % 2 == 0 { "Central" } else { "Northeast" };
            let kind = if i % 5 == 0 { "Burglary of Vehicle" } else { "Theft" };
            crime(&format!("c{i:02}"), d(2025, 6, 1) + Duration::days(i), kind, area, "75201")
        })
        .collect();
    store.insert_crimes(&rows).unwrap();
}

#[test]
fn listings_paginate_newest_first() {
    let store = store();
    seed_crimes(&store);

    let first = store.list_crimes(&RecordFilter::default(), 1, 10).unwrap();
    assert_eq!(first.total, 25);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.items[0].report_date, d(2025, 6, 25));

    let last = store.list_crimes(&RecordFilter::default(), 3, 10).unwrap();
    assert_eq!(last.items.len(), 5);
    assert_eq!(last.items[4].report_date, d(2025, 6, 1));
}

#[test]
fn page_zero_is_treated_as_first_page() {
    let store = store();
    seed_crimes(&store);
    let page = store.list_crimes(&RecordFilter::default(), 0, 5).unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.items.len(), 5);
}

#[test]
fn filters_narrow_the_listing() {
    let store = store();
    seed_crimes(&store);

    let central = RecordFilter::default().with(Dimension::ServiceArea, "Central");
    assert_eq!(store.list_crimes(&central, 1, 50).unwrap().total, 13);

    let june_first_week = central.clone().between(d(2025, 6, 1), d(2025, 6, 7));
    assert_eq!(store.list_crimes(&june_first_week, 1, 50).unwrap().total, 4);

    let burglaries = RecordFilter::default().search("Burglary");
    let page = store.list_crimes(&burglaries, 1, 50).unwrap();
    assert_eq!(page.total, 5);
    assert!(page.items.iter().all(|c| c.crime_type == "Burglary of Vehicle"));
}

#[test]
fn arrest_listing_maps_every_column_and_searches_offense() {
    let store = store();
    let day = d(2025, 6, 10);
    store
        .insert_arrests(&[
            arrest("a1", day - Duration::days(2), "THEFT", "Central"),
            arrest("a2", day, "AGGRAVATED ASSAULT", "Northeast"),
            arrest("a3", day - Duration::days(1), "ASSAULT", "Central"),
        ])
        .unwrap();

    let all = store.list_arrests(&RecordFilter::default(), 1, 10).unwrap();
    assert_eq!(all.total, 3);
    let ids: Vec<&str> = all.items.iter().map(|a| a.report_id.as_str()).collect();
    assert_eq!(ids, vec!["a2", "a3", "a1"]);
    assert_eq!(all.items[0], arrest("a2", day, "AGGRAVATED ASSAULT", "Northeast"));

    let assaults = store.list_arrests(&RecordFilter::default().search("ASSAULT"), 1, 10).unwrap();
    assert_eq!(assaults.total, 2);
    assert!(assaults.items.iter().all(|a| a.offense.contains("ASSAULT")));

    let central = RecordFilter::default().with(Dimension::ServiceArea, "Central").search("ASSAULT");
    let page = store.list_arrests(&central, 1, 10).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].report_id, "a3");
}

#[test]
fn call_listing_sorts_by_response_time_and_searches_problem() {
    let store = store();
    let day = d(2025, 6, 1);
    let at = |date: NaiveDate, h: u32, m: u32| date.and_hms_opt(h, m, 0).unwrap();
    store
        .insert_calls(&[
            call("c1", at(day, 9, 15), "Alarm", Some(240)),
            call("c2", at(day, 22, 5), "Disturbance", None),
            call("c3", at(day, 13, 40), "Major Disturbance (Violence)", Some(600)),
            call("c4", at(day + Duration::days(1), 1, 0), "Loud Music", Some(900)),
        ])
        .unwrap();

    let all = store.list_calls(&RecordFilter::default(), 1, 10).unwrap();
    let ids: Vec<&str> = all.items.iter().map(|c| c.incident_number.as_str()).collect();
    assert_eq!(ids, vec!["c4", "c2", "c3", "c1"]);
    assert_eq!(all.items[1], call("c2", at(day, 22, 5), "Disturbance", None));
    assert_eq!(all.items[3].response_seconds, Some(240));

    let disturbances = store.list_calls(&RecordFilter::default().search("Disturbance"), 1, 10).unwrap();
    let ids: Vec<&str> = disturbances.items.iter().map(|c| c.incident_number.as_str()).collect();
    assert_eq!(ids, vec!["c2", "c3"]);

    let first_day = RecordFilter::default().between(day, day);
    assert_eq!(store.list_calls(&first_day, 1, 10).unwrap().total, 3);
}

#[test]
fn filter_on_missing_dimension_is_an_error() {
    let store = store();
    let filter = RecordFilter::default().with(Dimension::Problem, "Alarm");
    assert!(store.list_crimes(&filter, 1, 10).is_err());
}

#[test]
fn filter_options_skip_zip_sentinels() {
    let store = store();
    let day = d(2025, 6, 1);
    store
        .insert_crimes(&[
            crime("1", day, "Theft", "Central", "75204"),
            crime("2", day, "Theft", "Central", "75201"),
            crime("3", day, "Theft", "Central", "Unknown"),
            crime("4", day, "Theft", "Central", "Out of City"),
            crime("6", day, "Theft", "Central", "OUT OF STATE"),
            crime("5", day, "Arson", "Northeast", "75201"),
        ])
        .unwrap();

    assert_eq!(
        store.distinct_values(Dataset::Crimes, Dimension::ZipCode).unwrap(),
        vec!["75201", "75204"]
    );
    assert_eq!(
        store.distinct_values(Dataset::Crimes, Dimension::ServiceArea).unwrap(),
        vec!["Central", "Northeast"]
    );
    assert_eq!(
        store.most_common_values(Dataset::Crimes, Dimension::CrimeType, 1).unwrap(),
        vec!["Theft"]
    );
}

#[test]
fn freshness_reports_anchor_rows_and_last_fetch() {
    let store = store();
    seed_crimes(&store);

    let at = |h: u32| d(2025, 6, 26).and_hms_opt(h, 0, 0).unwrap();
    for (hour, inserted) in [(6, 20), (7, 5)] {
        store
            .log_fetch(&FetchLogEntry {
                fetch_timestamp:  at(hour),
                dataset:          "crimes".to_string(),
                records_inserted: inserted,
                date_range_start: Some(d(2025, 6, 1)),
                date_range_end:   Some(d(2025, 6, 25)),
            })
            .unwrap();
    }

    let f = store.freshness(Dataset::Crimes).unwrap();
    assert_eq!(f.anchor, Some(d(2025, 6, 25)));
    assert_eq!(f.row_count, 25);
    let last = f.last_fetch.expect("last fetch");
    assert_eq!(last.fetch_timestamp, at(7));
    assert_eq!(last.records_inserted, 5);

    let calls = store.freshness(Dataset::Calls).unwrap();
    assert_eq!(calls.anchor, None);
    assert_eq!(calls.row_count, 0);
    assert!(calls.last_fetch.is_none());
}

#[test]
fn synthetic_load_logs_one_fetch_per_dataset() {
    let store = store();
    let spec = FeedSpec::seeded(21, 30);
    let load = SyntheticFeed::generate(&spec).load_into(&store).unwrap();

    assert_eq!(store.fetch_log_count().unwrap(), 3);
    let arrests = store.last_fetch(Some(Dataset::Arrests)).unwrap().expect("arrest fetch");
    assert_eq!(arrests.records_inserted, load.arrests as i64);
    assert_eq!(arrests.date_range_end, store.anchor_date(Dataset::Arrests).unwrap());
}
