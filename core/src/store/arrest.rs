use super::SafetyStore;
use crate::{error::InsightResult, records::ArrestRecord};
use rusqlite::params;

impl SafetyStore {
    // ── Arrest ─────────────────────────────────────────────────────────

    /// Insert a batch, ignoring report_ids already present.
    /// Returns the number of rows actually inserted.
    pub fn insert_arrests(&self, records: &[ArrestRecord]) -> InsightResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO arrests (
                    report_id, report_date, person_id, offense,
                    severity, service_area, zip_code, report_month
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for a in records {
                inserted += stmt.execute(params![
                    &a.report_id,
                    a.report_date,
                    &a.person_id,
                    &a.offense,
                    &a.severity,
                    &a.service_area,
                    &a.zip_code,
                    &a.report_month,
                ])?;
            }
        }
        tx.commit()?;
        if inserted == 0 && !records.is_empty() {
            log::warn!("store: all {} arrests were already present", records.len());
        }
        log::debug!(
            "store: arrests inserted={inserted} skipped={}",
            records.len() - inserted
        );
        Ok(inserted)
    }
}
