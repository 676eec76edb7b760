//! Session-scoped channel queries and their column/row result views.

use crate::core::filter::Filter;
use crate::core::registry::ChannelRegistry;
use crate::core::smoothing::smooth_dataset;
use crate::db::queries::get_channel_smoothing;
use crate::errors::{AppError, AppResult};
use crate::utils::sql::quote_ident;
use log::debug;
use rusqlite::{Connection, ToSql, params_from_iter};
use std::collections::{HashMap, VecDeque};

pub const SESSION_ID_COLUMN: &str = "session_id";

/// Result of [`query`]. Rows are read eagerly; `fetch_*` hand them out in
/// order, `count` at a time or all at once.
#[derive(Debug, Clone)]
pub struct DataSet {
    channels: Vec<String>,
    rows: VecDeque<Vec<Option<f64>>>,
    smoothing: HashMap<String, u32>,
}

impl DataSet {
    pub fn new(
        channels: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
        smoothing: HashMap<String, u32>,
    ) -> Self {
        Self {
            channels,
            rows: rows.into(),
            smoothing,
        }
    }

    /// Column labels, `session_id` first.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Rows not fetched yet.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    fn take(&mut self, count: Option<usize>) -> Vec<Vec<Option<f64>>> {
        let n = count.unwrap_or(self.rows.len()).min(self.rows.len());
        self.rows.drain(..n).collect()
    }

    /// Fetch up to `count` rows (all when `None`) as one sequence per
    /// column. Columns with a smoothing rate above 1 are smoothed over the
    /// fetched batch; a column holding any NULL is returned as stored.
    pub fn fetch_columns(&mut self, count: Option<usize>) -> AppResult<HashMap<String, Vec<Option<f64>>>> {
        let batch = self.take(count);
        let mut columns = HashMap::with_capacity(self.channels.len());

        for (idx, name) in self.channels.iter().enumerate() {
            let column: Vec<Option<f64>> = batch.iter().map(|row| row[idx]).collect();
            let rate = self.smoothing.get(name).copied().unwrap_or(1);

            let column = match column.iter().copied().collect::<Option<Vec<f64>>>() {
                Some(dense) if rate > 1 && !dense.is_empty() => {
                    smooth_dataset(&dense, rate)?.into_iter().map(Some).collect()
                }
                _ => column,
            };
            columns.insert(name.clone(), column);
        }
        Ok(columns)
    }

    /// Like [`fetch_columns`](Self::fetch_columns), zipped back into rows in
    /// channel order.
    pub fn fetch_records(&mut self, count: Option<usize>) -> AppResult<Vec<Vec<Option<f64>>>> {
        let mut columns = self.fetch_columns(count)?;
        let ordered: Vec<Vec<Option<f64>>> = self
            .channels
            .iter()
            .map(|c| columns.remove(c).unwrap_or_default())
            .collect();

        let len = ordered.first().map(Vec::len).unwrap_or(0);
        Ok((0..len)
            .map(|i| ordered.iter().map(|col| col[i]).collect())
            .collect())
    }
}

/// Select `channels` for the given sessions.
///
/// `sessions` must be non-empty. An empty channel list, or one containing
/// `*`, selects every known channel. The optional filter is ANDed with the
/// session restriction.
pub fn query<S: AsRef<str>>(
    conn: &Connection,
    registry: &ChannelRegistry,
    sessions: &[i64],
    channels: &[S],
    filter: Option<&Filter>,
    distinct: bool,
) -> AppResult<DataSet> {
    if sessions.is_empty() {
        return Err(AppError::datastore("Must provide a list of sessions to query"));
    }

    let channels: Vec<String> = if channels.is_empty() || channels.iter().any(|c| c.as_ref() == "*") {
        registry.names()
    } else {
        channels.iter().map(|c| c.as_ref().trim().to_string()).collect()
    };
    for ch in &channels {
        registry.describe(ch)?;
    }
    if let Some(f) = filter {
        for ch in f.channels() {
            registry.describe(ch)?;
        }
    }

    let mut columns = vec![format!("sample.session_id AS {}", SESSION_ID_COLUMN)];
    columns.extend(channels.iter().map(|c| {
        let ident = quote_ident(c);
        format!("datapoint.{} AS {}", ident, ident)
    }));

    let mut sql = format!(
        "SELECT {}{} FROM sample JOIN datapoint ON datapoint.sample_id = sample.id WHERE ",
        if distinct { "DISTINCT " } else { "" },
        columns.join(", ")
    );

    let mut params: Vec<&dyn ToSql> = Vec::new();
    if let Some(f) = filter.filter(|f| !f.is_empty()) {
        sql.push_str(&format!("({}) AND ", f));
        params.extend(f.params().iter().map(|p| p as &dyn ToSql));
    }

    let session_terms = vec!["sample.session_id = ?"; sessions.len()];
    sql.push_str(&format!("({})", session_terms.join(" OR ")));
    params.extend(sessions.iter().map(|s| s as &dyn ToSql));

    if !distinct {
        sql.push_str(" ORDER BY sample.id ASC");
    }

    debug!("DataStore: query execute: {}", sql);

    let width = channels.len() + 1;
    let mut stmt = conn.prepare(&sql)?;
    let mapped = stmt.query_map(params_from_iter(params), |row| {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(row.get::<_, Option<f64>>(i)?);
        }
        Ok(values)
    })?;
    let mut rows = Vec::new();
    for r in mapped {
        rows.push(r?);
    }

    let mut smoothing = HashMap::with_capacity(width);
    smoothing.insert(SESSION_ID_COLUMN.to_string(), 1);
    for ch in &channels {
        smoothing.insert(ch.clone(), get_channel_smoothing(conn, ch)?.unwrap_or(1));
    }

    let mut labels = vec![SESSION_ID_COLUMN.to_string()];
    labels.extend(channels);
    Ok(DataSet::new(labels, rows, smoothing))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(smoothing: u32) -> DataSet {
        let rows = vec![
            vec![Some(1.0), Some(1.0)],
            vec![Some(1.0), Some(1.0)],
            vec![Some(1.0), Some(1.0)],
            vec![Some(1.0), Some(1.0)],
            vec![Some(1.0), Some(5.0)],
        ];
        let mut map = HashMap::new();
        map.insert("session_id".to_string(), 1);
        map.insert("RPM".to_string(), smoothing);
        DataSet::new(vec!["session_id".into(), "RPM".into()], rows, map)
    }

    #[test]
    fn columns_are_smoothed_by_rate() {
        let mut ds = dataset(4);
        let cols = ds.fetch_columns(None).unwrap();
        let rpm: Vec<f64> = cols["RPM"].iter().map(|v| v.unwrap()).collect();
        assert_eq!(rpm, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(cols["session_id"], vec![Some(1.0); 5]);
    }

    #[test]
    fn rate_one_returns_stored_values() {
        let mut ds = dataset(1);
        let cols = ds.fetch_columns(None).unwrap();
        assert_eq!(cols["RPM"][1], Some(1.0));
    }

    #[test]
    fn records_follow_channel_order_and_count() {
        let mut ds = dataset(1);
        let first = ds.fetch_records(Some(2)).unwrap();
        assert_eq!(first, vec![vec![Some(1.0), Some(1.0)]; 2]);
        assert_eq!(ds.remaining(), 3);
        let rest = ds.fetch_records(None).unwrap();
        assert_eq!(rest.len(), 3);
        assert_eq!(rest[2], vec![Some(1.0), Some(5.0)]);
        assert!(ds.fetch_records(None).unwrap().is_empty());
    }

    #[test]
    fn null_column_is_not_smoothed() {
        let mut map = HashMap::new();
        map.insert("X".to_string(), 3);
        let mut ds = DataSet::new(
            vec!["X".into()],
            vec![vec![Some(1.0)], vec![None], vec![Some(3.0)]],
            map,
        );
        let cols = ds.fetch_columns(None).unwrap();
        assert_eq!(cols["X"], vec![Some(1.0), None, Some(3.0)]);
    }
}
