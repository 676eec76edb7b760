use crate::errors::AppResult;
use chrono::Local;
use rusqlite::Connection;
use rusqlite::params;

/// A row of the internal audit table.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

/// Write an internal log line into the `log` table.
pub fn ttlog(conn: &Connection, operation: &str, target: &str, message: &str) -> AppResult<()> {
    let now = Local::now().to_rfc3339();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![now, operation, target, message])?;

    Ok(())
}

/// Audit rows, newest first.
pub fn load_log(conn: &Connection) -> AppResult<Vec<LogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT date, operation, IFNULL(target, ''), message
         FROM log
         ORDER BY id DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(LogEntry {
            date: row.get(0)?,
            operation: row.get(1)?,
            target: row.get(2)?,
            message: row.get(3)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
