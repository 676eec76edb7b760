//! Schema manager for the wide `datapoint` table: one nullable REAL column
//! per channel ever seen, growing additively.

use crate::errors::{AppError, AppResult};
use crate::models::Channel;
use crate::utils::sql::{bare_ident, is_reserved_column, quote_ident};
use log::debug;
use rusqlite::Connection;

/// Columns of `datapoint` as SQLite reports them.
pub fn datapoint_columns(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(datapoint)")?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    let mut out = Vec::new();
    for c in cols {
        out.push(c?);
    }
    Ok(out)
}

/// Index names currently defined on `datapoint`.
pub fn datapoint_indexes(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA index_list(datapoint)")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Add a nullable REAL column for every channel not yet present.
/// SQLite column names are case-insensitive, so the comparison is too.
/// Returns the names of the columns actually added; calling it again with
/// the same channels adds nothing. A channel named like one of the table's
/// own columns is an error and nothing is added.
pub fn ensure_columns(conn: &Connection, channels: &[Channel]) -> AppResult<Vec<String>> {
    if let Some(c) = channels.iter().find(|c| is_reserved_column(&c.name)) {
        return Err(AppError::datastore(format!(
            "Channel name '{}' is reserved",
            c.name
        )));
    }

    let mut existing: Vec<String> = datapoint_columns(conn)?
        .into_iter()
        .map(|c| c.to_uppercase())
        .collect();

    let mut added = Vec::new();
    for channel in channels {
        let bare = bare_ident(&channel.name);
        if bare.is_empty() || existing.contains(&bare.to_uppercase()) {
            continue;
        }

        conn.execute_batch(&format!(
            "ALTER TABLE datapoint ADD COLUMN {} REAL;",
            quote_ident(&bare)
        ))?;
        debug!("DataStore: added datapoint column {}", bare);

        existing.push(bare.to_uppercase());
        added.push(bare);
    }
    Ok(added)
}

/// Create `<channel>_index_id` for every channel in `channels` that is
/// listed in `extra_index_channels` and not already indexed.
pub fn ensure_indexes(
    conn: &Connection,
    channels: &[Channel],
    extra_index_channels: &[String],
) -> AppResult<Vec<String>> {
    let existing = datapoint_indexes(conn)?;

    let mut created = Vec::new();
    for channel in channels {
        if !extra_index_channels.iter().any(|c| *c == channel.name) {
            continue;
        }

        let index_name = format!("{}_index_id", bare_ident(&channel.name));
        if existing.contains(&index_name) || created.contains(&index_name) {
            continue;
        }

        conn.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON datapoint({});",
            quote_ident(&index_name),
            quote_ident(&channel.name)
        ))?;
        created.push(index_name);
    }
    Ok(created)
}

/// Columns first, then the supplemental indexes that depend on them.
pub fn extend_datalog_channels(
    conn: &Connection,
    channels: &[Channel],
    extra_index_channels: &[String],
) -> AppResult<()> {
    ensure_columns(conn, channels)?;
    ensure_indexes(conn, channels, extra_index_channels)?;
    Ok(())
}
