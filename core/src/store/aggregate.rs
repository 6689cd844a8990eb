//! Window-anchored aggregate reads shared by every dataset.
//!
//! Every query here takes an explicit [`Window`]. Callers resolve the window
//! from the dataset's own anchor first; an empty table has no window and the
//! callers short-circuit to zero without touching these methods.

use super::{Dataset, Dimension, SafetyStore};
use crate::{
    error::InsightResult,
    types::{Count, LabelCount, WindowDays, OUT_OF_AREA_MARKER, UNKNOWN_ZIP},
    window::Window,
};
use chrono::NaiveDate;
use rusqlite::params;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    /// Largest count first; equal counts ordered by label ascending.
    CountDesc,
    /// Label ascending (query order used by insertion-ordered merges).
    LabelAsc,
}

/// How to group a windowed count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpec {
    pub dimension:  Dimension,
    pub order:      GroupOrder,
    pub limit:      Option<usize>,
    pub skip_blank: bool,
}

impl GroupSpec {
    pub fn all(dimension: Dimension) -> Self {
        Self { dimension, order: GroupOrder::CountDesc, limit: None, skip_blank: false }
    }

    pub fn top(dimension: Dimension, limit: usize) -> Self {
        Self { limit: Some(limit), ..Self::all(dimension) }
    }

    pub fn by_label(dimension: Dimension) -> Self {
        Self { order: GroupOrder::LabelAsc, ..Self::all(dimension) }
    }

    pub fn non_blank(mut self) -> Self {
        self.skip_blank = true;
        self
    }
}

impl SafetyStore {
    /// Latest date present in the dataset, or `None` when it is empty.
    pub fn anchor_date(&self, dataset: Dataset) -> InsightResult<Option<NaiveDate>> {
        let sql = format!("SELECT MAX({}) FROM {}", dataset.date_expr(), dataset.table());
        let anchor = self
            .conn
            .query_row(&sql, [], |row| row.get::<_, Option<NaiveDate>>(0))?;
        Ok(anchor)
    }

    /// Rows whose date falls inside the window.
    pub fn count_in(&self, dataset: Dataset, window: &Window) -> InsightResult<Count> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} BETWEEN ?1 AND ?2",
            dataset.table(),
            dataset.date_expr(),
        );
        let count = self
            .conn
            .query_row(&sql, params![window.start(), window.anchor], |row| row.get(0))?;
        Ok(count)
    }

    /// Grouped count over the window.
    ///
    /// Zip/postal groupings never include `Unknown` or out-of-jurisdiction
    /// ("Out of ...") codes.
    pub fn group_count(
        &self,
        dataset: Dataset,
        window:  &Window,
        spec:    GroupSpec,
    ) -> InsightResult<Vec<LabelCount>> {
        let expr = spec.dimension.expr_for(dataset)?;

        let mut filters = String::new();
        if spec.dimension == Dimension::ZipCode {
            filters.push_str(&format!(
                " AND {expr} != '{UNKNOWN_ZIP}' AND {expr} NOT LIKE '%{OUT_OF_AREA_MARKER}%'"
            ));
        }
        if spec.skip_blank {
            filters.push_str(&format!(" AND {expr} != ''"));
        }

        let order = match spec.order {
            GroupOrder::CountDesc => "ORDER BY cnt DESC, label ASC",
            GroupOrder::LabelAsc  => "ORDER BY label ASC",
        };
        let limit = spec.limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default();

        let sql = format!(
            "SELECT {expr} AS label, COUNT(*) AS cnt
             FROM {table}
             WHERE {date} BETWEEN ?1 AND ?2{filters}
             GROUP BY label
             {order}{limit}",
            table = dataset.table(),
            date = dataset.date_expr(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![window.start(), window.anchor], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Count>(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Sum of grouped counts whose label satisfies `pred`.
    pub fn count_matching(
        &self,
        dataset:   Dataset,
        window:    &Window,
        dimension: Dimension,
        pred:      impl Fn(&str) -> bool,
    ) -> InsightResult<Count> {
        let groups = self.group_count(dataset, window, GroupSpec::all(dimension))?;
        Ok(groups
            .iter()
            .filter(|(label, _)| pred(label.as_str()))
            .map(|(_, count)| count)
            .sum())
    }

    /// Per-date counts, ascending. Dates without rows are absent.
    pub fn daily_counts(
        &self,
        dataset: Dataset,
        window:  &Window,
    ) -> InsightResult<Vec<(NaiveDate, Count)>> {
        let sql = format!(
            "SELECT {date} AS day, COUNT(*)
             FROM {table}
             WHERE {date} BETWEEN ?1 AND ?2
             GROUP BY day
             ORDER BY day ASC",
            table = dataset.table(),
            date = dataset.date_expr(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![window.start(), window.anchor], |row| {
            Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, Count>(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of distinct dates with data on or before `anchor`.
    pub fn distinct_dates_through(&self, dataset: Dataset, anchor: NaiveDate) -> InsightResult<Count> {
        let sql = format!(
            "SELECT COUNT(DISTINCT {date}) FROM {table} WHERE {date} <= ?1",
            table = dataset.table(),
            date = dataset.date_expr(),
        );
        let count = self.conn.query_row(&sql, params![anchor], |row| row.get(0))?;
        Ok(count)
    }

    /// Total rows in a dataset regardless of date.
    pub fn row_count(&self, dataset: Dataset) -> InsightResult<Count> {
        let sql = format!("SELECT COUNT(*) FROM {}", dataset.table());
        let count = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    // ── Anchored conveniences ──────────────────────────────────────────
    //
    // These resolve the dataset's own anchor and return zero-valued results
    // for an empty table.

    /// Rows in the trailing `days` window of `dataset`.
    pub fn total_count(&self, dataset: Dataset, days: WindowDays) -> InsightResult<Count> {
        match self.window_for(dataset, days)? {
            Some(w) => self.count_in(dataset, &w),
            None => Ok(0),
        }
    }

    /// Grouped count over the trailing `days` window, count descending.
    pub fn breakdown_by(
        &self,
        dataset:   Dataset,
        dimension: Dimension,
        days:      WindowDays,
        limit:     Option<usize>,
    ) -> InsightResult<Vec<LabelCount>> {
        let spec = GroupSpec { limit, ..GroupSpec::all(dimension) };
        match self.window_for(dataset, days)? {
            Some(w) => self.group_count(dataset, &w, spec),
            None => Ok(Vec::new()),
        }
    }

    /// Sparse per-date series over the trailing `days` window.
    pub fn daily_trend(&self, dataset: Dataset, days: WindowDays) -> InsightResult<Vec<(NaiveDate, Count)>> {
        match self.window_for(dataset, days)? {
            Some(w) => self.daily_counts(dataset, &w),
            None => Ok(Vec::new()),
        }
    }
}
