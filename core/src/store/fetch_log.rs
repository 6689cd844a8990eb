//! Ingestion run log, read back only to report how fresh each feed is.

use super::{Dataset, SafetyStore};
use crate::{error::InsightResult, records::FetchLogEntry, types::Count};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFreshness {
    pub dataset:    Dataset,
    pub anchor:     Option<NaiveDate>,
    pub row_count:  Count,
    pub last_fetch: Option<FetchLogEntry>,
}

fn fetch_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<FetchLogEntry> {
    Ok(FetchLogEntry {
        fetch_timestamp:  row.get(0)?,
        dataset:          row.get(1)?,
        records_inserted: row.get(2)?,
        date_range_start: row.get(3)?,
        date_range_end:   row.get(4)?,
    })
}

impl SafetyStore {
    // ── Fetch log ──────────────────────────────────────────────────────

    pub fn log_fetch(&self, entry: &FetchLogEntry) -> InsightResult<()> {
        self.conn.execute(
            "INSERT INTO fetch_log (
                fetch_timestamp, dataset, records_inserted, date_range_start, date_range_end
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.fetch_timestamp,
                &entry.dataset,
                entry.records_inserted,
                entry.date_range_start,
                entry.date_range_end,
            ],
        )?;
        Ok(())
    }

    /// Most recent ingestion run, optionally restricted to one dataset.
    pub fn last_fetch(&self, dataset: Option<Dataset>) -> InsightResult<Option<FetchLogEntry>> {
        let entry = match dataset {
            Some(d) => self
                .conn
                .query_row(
                    "SELECT fetch_timestamp, dataset, records_inserted, date_range_start, date_range_end
                     FROM fetch_log WHERE dataset = ?1
                     ORDER BY fetch_timestamp DESC, id DESC LIMIT 1",
                    params![d.name()],
                    fetch_row_mapper,
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    "SELECT fetch_timestamp, dataset, records_inserted, date_range_start, date_range_end
                     FROM fetch_log
                     ORDER BY fetch_timestamp DESC, id DESC LIMIT 1",
                    [],
                    fetch_row_mapper,
                )
                .optional()?,
        };
        Ok(entry)
    }

    pub fn fetch_log_count(&self) -> InsightResult<Count> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM fetch_log", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Anchor date, row count and last ingestion run for one dataset.
    pub fn freshness(&self, dataset: Dataset) -> InsightResult<DatasetFreshness> {
        Ok(DatasetFreshness {
            dataset,
            anchor:     self.anchor_date(dataset)?,
            row_count:  self.row_count(dataset)?,
            last_fetch: self.last_fetch(Some(dataset))?,
        })
    }
}
