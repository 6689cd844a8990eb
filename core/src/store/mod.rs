//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Stats builders and the insights engine call store methods; they never
//! execute SQL directly.

use crate::{error::InsightResult, types::WindowDays, window::Window};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

mod aggregate;
mod arrest;
mod browse;
mod call;
mod crime;
mod fetch_log;

pub use aggregate::{GroupOrder, GroupSpec};
pub use browse::{Page, RecordFilter};
pub use crime::SeverityGroup;
pub use fetch_log::DatasetFreshness;

pub struct SafetyStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SafetyStore {
    pub fn open(path: &str) -> InsightResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL lets dashboard reads proceed while an ingestion run writes.
        // Shared-memory and :memory: databases ignore it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> InsightResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn, path: None })
    }

    /// Apply all schema migrations in order. Idempotent.
    pub fn migrate(&self) -> InsightResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_crimes.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_arrests.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_calls.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_fetch_log.sql"))?;
        log::debug!("store: migrations applied ({})", self.path.as_deref().unwrap_or(":memory:"));
        Ok(())
    }

    /// Resolve the trailing window for one dataset, anchored on that
    /// dataset's own latest date. `None` while the table is empty.
    pub fn window_for(&self, dataset: Dataset, days: WindowDays) -> InsightResult<Option<Window>> {
        Ok(Window::anchored(self.anchor_date(dataset)?, days))
    }
}

// ── Datasets and dimensions ────────────────────────────────────────────────

/// One of the three independently populated entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Crimes,
    Arrests,
    Calls,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Crimes, Dataset::Arrests, Dataset::Calls];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Crimes  => "crimes",
            Self::Arrests => "arrests",
            Self::Calls   => "calls",
        }
    }

    fn table(&self) -> &'static str {
        match self {
            Self::Crimes  => "crimes",
            Self::Arrests => "arrests",
            Self::Calls   => "calls_for_service",
        }
    }

    /// SQL expression yielding the row's calendar date.
    fn date_expr(&self) -> &'static str {
        match self {
            Self::Crimes | Self::Arrests => "report_date",
            Self::Calls                  => "date(response_timestamp)",
        }
    }

    fn zip_column(&self) -> &'static str {
        match self {
            Self::Crimes | Self::Arrests => "zip_code",
            Self::Calls                  => "postal_code",
        }
    }

    /// Column used for the record key; listings sort by it as a tiebreak.
    fn key_column(&self) -> &'static str {
        match self {
            Self::Crimes | Self::Arrests => "report_id",
            Self::Calls                  => "incident_number",
        }
    }
}

impl std::str::FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crimes"  => Ok(Self::Crimes),
            "arrests" => Ok(Self::Arrests),
            "calls"   => Ok(Self::Calls),
            other     => Err(format!("unknown dataset '{other}'")),
        }
    }
}

/// A groupable column. Not every dimension exists on every dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    CrimeType,
    CrimeAgainst,
    NibrsGroup,
    Offense,
    Severity,
    Problem,
    Priority,
    CallType,
    DispositionType,
    Weekday,
    ServiceArea,
    /// zip_code for crimes/arrests, postal_code for calls.
    ZipCode,
    /// Two-digit hour of the call timestamp.
    Hour,
}

impl Dimension {
    /// SQL expression for this dimension on `dataset`, if it has one.
    fn expr(&self, dataset: Dataset) -> Option<&'static str> {
        use Dataset::*;
        match (self, dataset) {
            (Self::ServiceArea, _)               => Some("service_area"),
            (Self::ZipCode, d)                   => Some(d.zip_column()),
            (Self::CrimeType, Crimes)            => Some("crime_type"),
            (Self::CrimeAgainst, Crimes)         => Some("crime_against"),
            (Self::NibrsGroup, Crimes)           => Some("nibrs_group"),
            (Self::Offense, Arrests)             => Some("offense"),
            (Self::Severity, Arrests)            => Some("severity"),
            (Self::Problem, Calls)               => Some("problem"),
            (Self::Priority, Calls)              => Some("priority"),
            (Self::CallType, Calls)              => Some("call_type"),
            (Self::DispositionType, Calls)       => Some("disposition_type"),
            (Self::Weekday, Calls)               => Some("weekday"),
            (Self::Hour, Calls)                  => Some("strftime('%H', response_timestamp)"),
            _                                    => None,
        }
    }

    fn expr_for(&self, dataset: Dataset) -> InsightResult<&'static str> {
        self.expr(dataset).ok_or_else(|| {
            anyhow::anyhow!("dataset '{}' has no {:?} dimension", dataset.name(), self).into()
        })
    }
}
