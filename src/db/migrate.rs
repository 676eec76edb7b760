use crate::errors::{AppError, AppResult};
use log::info;
use rusqlite::{Connection, OptionalExtension, Transaction};

/// A named schema step. Applied at most once; the version string is
/// recorded in `log` with `operation = 'migration_applied'`.
struct Migration {
    version: &'static str,
    description: &'static str,
    apply: fn(&Transaction<'_>) -> rusqlite::Result<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20170110_0001_create_core_tables",
        description: "Created session, sample, datapoint and channel tables",
        apply: create_core_tables,
    },
    Migration {
        version: "20170402_0002_add_channel_smoothing",
        description: "Added per-channel smoothing column",
        apply: add_channel_smoothing,
    },
    Migration {
        version: "20170915_0003_add_lookup_indexes",
        description: "Added indexes for sample/session and datapoint/sample lookups",
        apply: add_lookup_indexes,
    },
];

/// Ensure that the `log` table exists; it doubles as the migration ledger.
fn ensure_log_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )
}

fn create_core_tables(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS session (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL,
            notes TEXT DEFAULT '',
            date  REAL
        );

        CREATE TABLE IF NOT EXISTS sample (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS datapoint (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            sample_id INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS channel (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id  INTEGER,
            name        TEXT NOT NULL,
            units       TEXT DEFAULT '',
            min_value   REAL,
            max_value   REAL,
            sample_rate INTEGER
        );
        "#,
    )
}

fn channel_has_smoothing(tx: &Transaction<'_>) -> rusqlite::Result<bool> {
    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('channel') WHERE name = 'smoothing'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn add_channel_smoothing(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    if channel_has_smoothing(tx)? {
        return Ok(());
    }
    tx.execute_batch("ALTER TABLE channel ADD COLUMN smoothing INTEGER NOT NULL DEFAULT 1;")
}

fn add_lookup_indexes(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sample_session_id ON sample(session_id);
        CREATE INDEX IF NOT EXISTS idx_datapoint_sample_id ON datapoint(sample_id);
        CREATE INDEX IF NOT EXISTS idx_channel_name ON channel(name);
        CREATE INDEX IF NOT EXISTS idx_channel_session_id ON channel(session_id);
        "#,
    )
}

fn is_applied(conn: &Connection, version: &str) -> rusqlite::Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Versions already recorded in the ledger, oldest first.
pub fn applied_migrations(conn: &Connection) -> AppResult<Vec<String>> {
    ensure_log_table(conn)?;
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Public entry point: run all pending migrations, each in its own
/// transaction. Returns the versions applied by this call.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !matches!(is_applied(conn, m.version), Ok(true)))
        .collect();

    if pending.is_empty() {
        return Ok(Vec::new());
    }

    info!(
        "DataStore: Applying db migrations: {:?}",
        pending.iter().map(|m| m.version).collect::<Vec<_>>()
    );

    let mut applied = Vec::new();
    for m in pending {
        let tx = conn.unchecked_transaction()?;

        (m.apply)(&tx).map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

        tx.execute(
            "INSERT INTO log (date, operation, target, message)
             VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
            [m.version, m.description],
        )?;
        tx.commit()?;

        info!("DataStore: migration applied: {}", m.version);
        applied.push(m.version);
    }

    info!("DataStore: db migrations complete");
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_once() {
        let conn = Connection::open_in_memory().unwrap();
        let first = run_pending_migrations(&conn).unwrap();
        assert_eq!(first.len(), MIGRATIONS.len());

        let second = run_pending_migrations(&conn).unwrap();
        assert!(second.is_empty());

        let ledger = applied_migrations(&conn).unwrap();
        assert_eq!(ledger.len(), MIGRATIONS.len());
        assert_eq!(ledger[0], MIGRATIONS[0].version);
    }

    #[test]
    fn smoothing_column_defaults_to_one() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO channel (session_id, name, units, min_value, max_value, sample_rate)
             VALUES (1, 'RPM', '', 0, 8000, 10)",
            [],
        )
        .unwrap();
        let smoothing: i64 = conn
            .query_row("SELECT smoothing FROM channel WHERE name = 'RPM'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(smoothing, 1);
    }
}
