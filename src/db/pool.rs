//! SQLite connection wrapper with the transaction discipline every
//! multi-statement write goes through.

use crate::errors::AppResult;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};

pub struct DbPool {
    pub conn: Connection,
    path: Option<PathBuf>,
}

impl DbPool {
    pub fn new<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Ok(Self {
            conn,
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    pub fn in_memory() -> AppResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// File backing this connection; `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `func` inside one transaction. Commits on `Ok`; on `Err` the
    /// transaction is rolled back and the error is returned unchanged.
    pub fn with_transaction<F, T>(&mut self, func: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AppResult<T>,
    {
        let tx = self.conn.transaction()?;
        match func(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback() {
                    log::error!("DataStore: rollback failed: {}", rb);
                }
                Err(e)
            }
        }
    }
}
