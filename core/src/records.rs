//! Normalized rows deposited by the ingestion collaborator.
//!
//! Rows are inserted once and never mutated. The insights engine only reads
//! them back through aggregate queries in the store.

use crate::types::UNKNOWN_ZIP;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

fn unknown_zip() -> String {
    UNKNOWN_ZIP.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRecord {
    pub report_id:     String,
    pub report_date:   NaiveDate,
    pub crime_type:    String,
    pub crime_against: String, // PERSON | PROPERTY | SOCIETY
    pub service_area:  String,
    #[serde(default = "unknown_zip")]
    pub zip_code:      String,
    #[serde(default)]
    pub nibrs_group:   String,
    #[serde(default)]
    pub occurred_at:   Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrestRecord {
    pub report_id:    String,
    pub report_date:  NaiveDate,
    pub person_id:    String,
    pub offense:      String,
    pub severity:     String, // free text, e.g. "Felony 2nd Degree", "Misdemeanor A"
    pub service_area: String,
    #[serde(default = "unknown_zip")]
    pub zip_code:     String,
    #[serde(default)]
    pub report_month: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub incident_number:    String,
    pub response_timestamp: NaiveDateTime,
    pub priority:           String,
    pub problem:            String,
    pub call_type:          String, // Emergency | Non-Emergency
    pub service_area:       String,
    #[serde(default = "unknown_zip")]
    pub postal_code:        String,
    #[serde(default)]
    pub response_seconds:   Option<i64>,
    #[serde(default)]
    pub disposition_type:   String,
    #[serde(default)]
    pub weekday:            String,
}

/// One ingestion run. Read back only to report data freshness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchLogEntry {
    pub fetch_timestamp:  NaiveDateTime,
    pub dataset:          String,
    pub records_inserted: i64,
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end:   Option<NaiveDate>,
}
