//! Filtered, paginated record listings and filter-option lookups.

use super::{Dataset, Dimension, SafetyStore};
use crate::{
    error::InsightResult,
    records::{ArrestRecord, CallRecord, CrimeRecord},
    types::{Count, OUT_OF_AREA_MARKER, UNKNOWN_ZIP},
};
use chrono::NaiveDate;
use rusqlite::{params_from_iter, types::Value};
use serde::{Deserialize, Serialize};

/// Listing filter. Every populated field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Exact matches, e.g. (ServiceArea, "EAST").
    #[serde(default)]
    pub equals:    Vec<(Dimension, String)>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to:   Option<NaiveDate>,
    /// Substring search over the dataset's descriptive column(s).
    #[serde(default)]
    pub search:    Option<String>,
}

impl RecordFilter {
    pub fn with(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.equals.push((dimension, value.into()));
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    fn where_clause(&self, dataset: Dataset) -> InsightResult<(String, Vec<Value>)> {
        let mut sql = String::from("WHERE 1=1");
        let mut values = Vec::new();

        for (dimension, value) in &self.equals {
            sql.push_str(&format!(" AND {} = ?", dimension.expr_for(dataset)?));
            values.push(Value::Text(value.clone()));
        }
        if let Some(from) = self.date_from {
            sql.push_str(&format!(" AND {} >= ?", dataset.date_expr()));
            values.push(Value::Text(from.to_string()));
        }
        if let Some(to) = self.date_to {
            sql.push_str(&format!(" AND {} <= ?", dataset.date_expr()));
            values.push(Value::Text(to.to_string()));
        }
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            let pattern = format!("%{term}%");
            let columns = search_columns(dataset);
            let ors: Vec<String> = columns.iter().map(|c| format!("{c} LIKE ?")).collect();
            sql.push_str(&format!(" AND ({})", ors.join(" OR ")));
            values.extend(columns.iter().map(|_| Value::Text(pattern.clone())));
        }
        Ok((sql, values))
    }
}

fn search_columns(dataset: Dataset) -> &'static [&'static str] {
    match dataset {
        Dataset::Crimes  => &["crime_type", "nibrs_group"],
        Dataset::Arrests => &["offense"],
        Dataset::Calls   => &["problem"],
    }
}

fn sort_expr(dataset: Dataset) -> &'static str {
    match dataset {
        Dataset::Crimes | Dataset::Arrests => "report_date",
        Dataset::Calls                     => "response_timestamp",
    }
}

/// One page of a listing. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items:       Vec<T>,
    pub total:       Count,
    pub page:        u32,
    pub per_page:    u32,
    pub total_pages: u32,
}

impl SafetyStore {
    fn list_records<T>(
        &self,
        dataset:  Dataset,
        columns:  &str,
        filter:   &RecordFilter,
        page:     u32,
        per_page: u32,
        mapper:   impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    ) -> InsightResult<Page<T>> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let (where_sql, values) = filter.where_clause(dataset)?;

        let total: Count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {} {where_sql}", dataset.table()),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let offset = u64::from(page - 1) * u64::from(per_page);
        let sql = format!(
            "SELECT {columns} FROM {table} {where_sql}
             ORDER BY {sort} DESC, {key} DESC
             LIMIT {per_page} OFFSET {offset}",
            table = dataset.table(),
            sort = sort_expr(dataset),
            key = dataset.key_column(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(values.iter()), mapper)?
            .collect::<Result<Vec<_>, _>>()?;

        let total_pages = ((total as u64 + u64::from(per_page) - 1) / u64::from(per_page)) as u32;
        Ok(Page { items, total, page, per_page, total_pages })
    }

    pub fn list_crimes(
        &self,
        filter:   &RecordFilter,
        page:     u32,
        per_page: u32,
    ) -> InsightResult<Page<CrimeRecord>> {
        self.list_records(
            Dataset::Crimes,
            "report_id, report_date, crime_type, crime_against, service_area,
             zip_code, nibrs_group, occurred_at",
            filter,
            page,
            per_page,
            |row| {
                Ok(CrimeRecord {
                    report_id:     row.get(0)?,
                    report_date:   row.get(1)?,
                    crime_type:    row.get(2)?,
                    crime_against: row.get(3)?,
                    service_area:  row.get(4)?,
                    zip_code:      row.get(5)?,
                    nibrs_group:   row.get(6)?,
                    occurred_at:   row.get(7)?,
                })
            },
        )
    }

    pub fn list_arrests(
        &self,
        filter:   &RecordFilter,
        page:     u32,
        per_page: u32,
    ) -> InsightResult<Page<ArrestRecord>> {
        self.list_records(
            Dataset::Arrests,
            "report_id, report_date, person_id, offense, severity, service_area,
             zip_code, report_month",
            filter,
            page,
            per_page,
            |row| {
                Ok(ArrestRecord {
                    report_id:    row.get(0)?,
                    report_date:  row.get(1)?,
                    person_id:    row.get(2)?,
                    offense:      row.get(3)?,
                    severity:     row.get(4)?,
                    service_area: row.get(5)?,
                    zip_code:     row.get(6)?,
                    report_month: row.get(7)?,
                })
            },
        )
    }

    pub fn list_calls(
        &self,
        filter:   &RecordFilter,
        page:     u32,
        per_page: u32,
    ) -> InsightResult<Page<CallRecord>> {
        self.list_records(
            Dataset::Calls,
            "incident_number, response_timestamp, priority, problem, call_type,
             service_area, postal_code, response_seconds, disposition_type, weekday",
            filter,
            page,
            per_page,
            |row| {
                Ok(CallRecord {
                    incident_number:    row.get(0)?,
                    response_timestamp: row.get(1)?,
                    priority:           row.get(2)?,
                    problem:            row.get(3)?,
                    call_type:          row.get(4)?,
                    service_area:       row.get(5)?,
                    postal_code:        row.get(6)?,
                    response_seconds:   row.get(7)?,
                    disposition_type:   row.get(8)?,
                    weekday:            row.get(9)?,
                })
            },
        )
    }

    // ── Filter options ─────────────────────────────────────────────────

    /// Every distinct value of a dimension across all time, ascending.
    /// Zip dimensions leave out the Unknown / out-of-jurisdiction sentinels.
    pub fn distinct_values(&self, dataset: Dataset, dimension: Dimension) -> InsightResult<Vec<String>> {
        let expr = dimension.expr_for(dataset)?;
        let filter = if dimension == Dimension::ZipCode {
            format!("WHERE {expr} != '{UNKNOWN_ZIP}' AND {expr} NOT LIKE '%{OUT_OF_AREA_MARKER}%'")
        } else {
            String::new()
        };
        let sql = format!(
            "SELECT DISTINCT {expr} AS v FROM {table} {filter} ORDER BY v ASC",
            table = dataset.table(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// The `limit` most frequent values of a dimension across all time.
    pub fn most_common_values(
        &self,
        dataset:   Dataset,
        dimension: Dimension,
        limit:     usize,
    ) -> InsightResult<Vec<String>> {
        let expr = dimension.expr_for(dataset)?;
        let sql = format!(
            "SELECT {expr} AS v, COUNT(*) AS cnt FROM {table}
             GROUP BY v ORDER BY cnt DESC, v ASC LIMIT {limit}",
            table = dataset.table(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
