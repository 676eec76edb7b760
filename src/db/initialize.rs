use crate::db::migrate::run_pending_migrations;
use crate::errors::{AppError, AppResult};
use rusqlite::Connection;

/// Initialize the database.
/// All schema creation and upgrades are delegated to the migration engine;
/// any failure is reported as `AppError::Migration` so opening aborts.
pub fn init_db(conn: &Connection) -> AppResult<()> {
    match run_pending_migrations(conn) {
        Ok(_) => Ok(()),
        Err(AppError::Migration(msg)) => Err(AppError::Migration(msg)),
        Err(other) => Err(AppError::Migration(other.to_string())),
    }
}
