use super::SafetyStore;
use crate::{error::InsightResult, records::CrimeRecord, types::Count, window::Window};
use rusqlite::params;

/// One (crime_type, crime_against) group and its row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityGroup {
    pub crime_type:    String,
    pub crime_against: String,
    pub count:         Count,
}

impl SafetyStore {
    // ── Crime ──────────────────────────────────────────────────────────

    /// Insert a batch, ignoring report_ids already present.
    /// Returns the number of rows actually inserted.
    pub fn insert_crimes(&self, records: &[CrimeRecord]) -> InsightResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO crimes (
                    report_id, report_date, crime_type, crime_against,
                    service_area, zip_code, nibrs_group, occurred_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for c in records {
                inserted += stmt.execute(params![
                    &c.report_id,
                    c.report_date,
                    &c.crime_type,
                    &c.crime_against,
                    &c.service_area,
                    &c.zip_code,
                    &c.nibrs_group,
                    c.occurred_at,
                ])?;
            }
        }
        tx.commit()?;
        if inserted == 0 && !records.is_empty() {
            log::warn!("store: all {} crimes were already present", records.len());
        }
        log::debug!(
            "store: crimes inserted={inserted} skipped={}",
            records.len() - inserted
        );
        Ok(inserted)
    }

    /// Crimes in the window grouped by (type, category), ordered by both.
    pub fn severity_groups(&self, window: &Window) -> InsightResult<Vec<SeverityGroup>> {
        let mut stmt = self.conn.prepare(
            "SELECT crime_type, crime_against, COUNT(*)
             FROM crimes
             WHERE report_date BETWEEN ?1 AND ?2
             GROUP BY crime_type, crime_against
             ORDER BY crime_type ASC, crime_against ASC",
        )?;
        let rows = stmt.query_map(params![window.start(), window.anchor], |row| {
            Ok(SeverityGroup {
                crime_type:    row.get(0)?,
                crime_against: row.get(1)?,
                count:         row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
