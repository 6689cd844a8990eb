use super::SafetyStore;
use crate::{error::InsightResult, records::CallRecord, window::Window};
use rusqlite::params;

impl SafetyStore {
    // ── Calls for service ──────────────────────────────────────────────

    /// Insert a batch, ignoring incident numbers already present.
    /// Returns the number of rows actually inserted.
    pub fn insert_calls(&self, records: &[CallRecord]) -> InsightResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO calls_for_service (
                    incident_number, response_timestamp, priority, problem,
                    call_type, service_area, postal_code, response_seconds,
                    disposition_type, weekday
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for c in records {
                inserted += stmt.execute(params![
                    &c.incident_number,
                    c.response_timestamp,
                    &c.priority,
                    &c.problem,
                    &c.call_type,
                    &c.service_area,
                    &c.postal_code,
                    c.response_seconds,
                    &c.disposition_type,
                    &c.weekday,
                ])?;
            }
        }
        tx.commit()?;
        if inserted == 0 && !records.is_empty() {
            log::warn!("store: all {} calls were already present", records.len());
        }
        log::debug!(
            "store: calls inserted={inserted} skipped={}",
            records.len() - inserted
        );
        Ok(inserted)
    }

    /// Mean of the positive, non-null response times in the window, in seconds.
    /// `None` when no call qualifies.
    pub fn mean_response_seconds(&self, window: &Window) -> InsightResult<Option<f64>> {
        let mean = self.conn.query_row(
            "SELECT AVG(response_seconds) FROM calls_for_service
             WHERE date(response_timestamp) BETWEEN ?1 AND ?2
               AND response_seconds IS NOT NULL AND response_seconds > 0",
            params![window.start(), window.anchor],
            |row| row.get::<_, Option<f64>>(0),
        )?;
        Ok(mean)
    }
}
