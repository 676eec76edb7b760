//! Aggregate statements over datapoint columns, and store-level counters.

use crate::errors::AppResult;
use crate::utils::sql::{placeholders, quote_ident};
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Avg,
    Min,
    Max,
}

impl Aggregate {
    fn sql(&self) -> &'static str {
        match self {
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

/// Aggregate value plus, for MIN/MAX, the extra channels read from the
/// row holding the extreme.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub value: Option<f64>,
    pub extra: Vec<Option<f64>>,
}

/// ` JOIN sample ... WHERE sample.session_id IN (?,...)` when sessions are
/// given, plus the values to bind.
fn session_join_clause(sessions: Option<&[i64]>) -> (String, Vec<Value>) {
    match sessions {
        Some(ids) if !ids.is_empty() => (
            format!(
                " JOIN sample ON datapoint.sample_id = sample.id WHERE sample.session_id IN ({})",
                placeholders(ids.len())
            ),
            ids.iter().map(|id| Value::Integer(*id)).collect(),
        ),
        _ => (String::new(), Vec::new()),
    }
}

/// Run `AGG(channel)` over datapoint, optionally scoped to sessions and
/// optionally ignoring rows where the channel is exactly zero.
pub fn channel_aggregate(
    conn: &Connection,
    aggregate: Aggregate,
    channel: &str,
    sessions: Option<&[i64]>,
    extra_channels: &[String],
    exclude_zero: bool,
) -> AppResult<AggregateRow> {
    let column = format!("datapoint.{}", quote_ident(channel));
    let extras: String = extra_channels
        .iter()
        .map(|c| format!(", datapoint.{}", quote_ident(c)))
        .collect();

    let (join, params) = session_join_clause(sessions);
    let mut sql = format!(
        "SELECT {}({}){} FROM datapoint{}",
        aggregate.sql(),
        column,
        extras,
        join
    );

    if exclude_zero {
        sql.push_str(if join.is_empty() { " WHERE " } else { " AND " });
        sql.push_str(&format!("{} != 0", column));
    }

    let row = conn.query_row(&sql, params_from_iter(params), |row| {
        let value: Option<f64> = row.get(0)?;
        let mut extra = Vec::with_capacity(extra_channels.len());
        for i in 0..extra_channels.len() {
            extra.push(row.get::<_, Option<f64>>(i + 1)?);
        }
        Ok(AggregateRow { value, extra })
    })?;
    Ok(row)
}

/// Average of the non-zero Latitude/Longitude pairs.
pub fn location_center(conn: &Connection, sessions: Option<&[i64]>) -> AppResult<(Option<f64>, Option<f64>)> {
    let (join, params) = session_join_clause(sessions);
    let sql = format!(
        "SELECT AVG(datapoint.\"Latitude\"), AVG(datapoint.\"Longitude\") FROM datapoint{} {} datapoint.\"Latitude\" != 0 AND datapoint.\"Longitude\" != 0",
        join,
        if join.is_empty() { "WHERE" } else { "AND" }
    );

    let center = conn.query_row(&sql, params_from_iter(params), |row| {
        Ok((row.get::<_, Option<f64>>(0)?, row.get::<_, Option<f64>>(1)?))
    })?;
    Ok(center)
}

/// Store-level counters for `telemstore db --info`.
#[derive(Debug, Clone, Default)]
pub struct DbInfo {
    pub file_size: u64,
    pub sessions: i64,
    pub samples: i64,
    pub channels: i64,
    pub datapoint_columns: usize,
}

pub fn db_info(conn: &Connection, db_path: Option<&std::path::Path>) -> AppResult<DbInfo> {
    let file_size = db_path
        .and_then(|p| fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    let sessions: i64 = conn.query_row("SELECT COUNT(*) FROM session", [], |row| row.get(0))?;
    let samples: i64 = conn.query_row("SELECT COUNT(*) FROM sample", [], |row| row.get(0))?;
    let channels: i64 = conn.query_row("SELECT COUNT(DISTINCT name) FROM channel", [], |row| {
        row.get(0)
    })?;
    // minus id and sample_id
    let datapoint_columns = crate::db::schema::datapoint_columns(conn)?
        .len()
        .saturating_sub(2);

    Ok(DbInfo {
        file_size,
        sessions,
        samples,
        channels,
        datapoint_columns,
    })
}

/// `PRAGMA integrity_check`: a single `"ok"` row when the file is sound.
pub fn integrity_check(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA integrity_check;")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn vacuum(conn: &Connection) -> AppResult<()> {
    conn.execute_batch("VACUUM;")?;
    Ok(())
}
