//! Row-level statements over the session, sample, datapoint and channel
//! tables. Callers own the transaction; nothing here commits.

use crate::errors::{AppError, AppResult};
use crate::models::channel::pin_system_channels;
use crate::models::{Channel, Session};
use crate::utils::sql::{is_reserved_column, placeholders, quote_ident};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

pub fn insert_session(conn: &Connection, name: &str, notes: &str, date: f64) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO session (name, notes, date) VALUES (?1, ?2, ?3)",
        params![name, notes, date],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_session(conn: &Connection, session: &Session, date: f64) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE session SET name = ?1, notes = ?2, date = ?3 WHERE id = ?4",
        params![session.name, session.notes, date, session.session_id],
    )?;
    Ok(n)
}

fn map_session(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        session_id: row.get("id")?,
        name: row.get("name")?,
        notes: row.get::<_, Option<String>>("notes")?.unwrap_or_default(),
        date: row.get("date")?,
    })
}

/// All sessions, newest first.
pub fn list_sessions(conn: &Connection) -> AppResult<Vec<Session>> {
    let mut stmt = conn.prepare("SELECT id, name, notes, date FROM session ORDER BY date DESC, id DESC")?;
    let rows = stmt.query_map([], map_session)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn get_session(conn: &Connection, session_id: i64) -> AppResult<Option<Session>> {
    let session = conn
        .query_row(
            "SELECT id, name, notes, date FROM session WHERE id = ?1",
            [session_id],
            map_session,
        )
        .optional()?;
    Ok(session)
}

/// Rows removed by a cascading session delete, per table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeletedRows {
    pub datapoints: usize,
    pub samples: usize,
    pub sessions: usize,
    pub channels: usize,
}

pub fn delete_session_rows(conn: &Connection, session_id: i64) -> AppResult<DeletedRows> {
    let datapoints = conn.execute(
        "DELETE FROM datapoint WHERE sample_id IN (SELECT id FROM sample WHERE session_id = ?1)",
        [session_id],
    )?;
    let samples = conn.execute("DELETE FROM sample WHERE session_id = ?1", [session_id])?;
    let sessions = conn.execute("DELETE FROM session WHERE id = ?1", [session_id])?;
    let channels = conn.execute("DELETE FROM channel WHERE session_id = ?1", [session_id])?;

    Ok(DeletedRows {
        datapoints,
        samples,
        sessions,
        channels,
    })
}

/// Record which channels a session carries. Smoothing starts at 1.
pub fn insert_session_channels(conn: &Connection, session_id: i64, channels: &[Channel]) -> AppResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO channel (session_id, name, units, min_value, max_value, sample_rate, smoothing)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
    )?;
    for ch in channels {
        stmt.execute(params![
            session_id,
            ch.name,
            ch.units,
            ch.min,
            ch.max,
            ch.sample_rate as i64
        ])?;
    }
    Ok(())
}

fn map_channel(row: &Row) -> rusqlite::Result<Channel> {
    let sample_rate: i64 = row.get(4)?;
    let smoothing: i64 = row.get(5)?;
    Ok(Channel {
        name: row.get(0)?,
        units: row.get(1)?,
        min: row.get(2)?,
        max: row.get(3)?,
        sample_rate: sample_rate.clamp(0, u32::MAX as i64) as u32,
        smoothing: smoothing.clamp(1, u32::MAX as i64) as u32,
    })
}

/// Channel definitions as stored, one row per distinct definition,
/// optionally restricted to one session. System channels come first.
pub fn load_channel_rows(conn: &Connection, session_id: Option<i64>) -> AppResult<Vec<Channel>> {
    let where_clause = if session_id.is_some() {
        "WHERE session_id = ?1"
    } else {
        ""
    };
    let sql = format!(
        "SELECT DISTINCT name,
                IFNULL(units, '') AS units,
                IFNULL(min_value, 0) AS min_value,
                IFNULL(max_value, 0) AS max_value,
                IFNULL(sample_rate, 0) AS sample_rate,
                IFNULL(smoothing, 1) AS smoothing
         FROM channel {}
         ORDER BY name ASC, min_value ASC, max_value DESC, sample_rate DESC",
        where_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = match session_id {
        Some(id) => stmt.query_map([id], map_channel)?,
        None => stmt.query_map([], map_channel)?,
    };

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    pin_system_channels(&mut out);
    Ok(out)
}

pub fn set_channel_smoothing(conn: &Connection, name: &str, smoothing: u32) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE channel SET smoothing = ?1 WHERE name = ?2",
        params![smoothing as i64, name],
    )?;
    Ok(n)
}

pub fn get_channel_smoothing(conn: &Connection, name: &str) -> AppResult<Option<u32>> {
    let smoothing: Option<i64> = conn
        .query_row(
            "SELECT smoothing FROM channel WHERE channel.name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(smoothing.map(|s| s.clamp(1, u32::MAX as i64) as u32))
}

pub fn insert_sample(conn: &Connection, session_id: i64) -> AppResult<i64> {
    let mut stmt = conn.prepare_cached("INSERT INTO sample (session_id) VALUES (?1)")?;
    stmt.execute([session_id])?;
    Ok(conn.last_insert_rowid())
}

/// `INSERT INTO datapoint (sample_id, <names...>) VALUES (?, ...)`
pub fn datapoint_insert_sql<S: AsRef<str>>(names: &[S]) -> String {
    let mut columns = vec!["sample_id".to_string()];
    columns.extend(names.iter().map(|n| quote_ident(n.as_ref())));
    format!(
        "INSERT INTO datapoint ({}) VALUES ({})",
        columns.join(","),
        placeholders(columns.len())
    )
}

pub fn insert_datapoint<S: AsRef<str>>(
    conn: &Connection,
    sample_id: i64,
    names: &[S],
    values: &[Option<f64>],
) -> AppResult<()> {
    if let Some(n) = names.iter().find(|n| is_reserved_column(n.as_ref())) {
        return Err(AppError::datastore(format!(
            "Channel name '{}' is reserved",
            n.as_ref()
        )));
    }
    let sql = datapoint_insert_sql(names);
    let mut stmt = conn.prepare_cached(&sql)?;

    let mut bound: Vec<Value> = Vec::with_capacity(values.len() + 1);
    bound.push(Value::Integer(sample_id));
    bound.extend(values.iter().map(|v| match v {
        Some(x) => Value::Real(*x),
        None => Value::Null,
    }));

    stmt.execute(params_from_iter(bound))?;
    Ok(())
}

pub fn session_record_count(conn: &Connection, session_id: i64) -> AppResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(session_id) FROM sample WHERE session_id = ?1",
        [session_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_quotes_channel_names() {
        let sql = datapoint_insert_sql(&["RPM", "Oil Temp"]);
        assert_eq!(
            sql,
            "INSERT INTO datapoint (sample_id,\"RPM\",\"Oil Temp\") VALUES (?,?,?)"
        );
    }

    #[test]
    fn datapoint_insert_refuses_structural_columns() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::migrate::run_pending_migrations(&conn).unwrap();
        let sample_id = insert_sample(&conn, 1).unwrap();

        let err = insert_datapoint(&conn, sample_id, &["ID"], &[Some(7.0)]).unwrap_err();
        assert!(matches!(err, AppError::Datastore(ref m) if m.contains("reserved")));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM datapoint", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }
}
