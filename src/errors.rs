//! Unified datastore error type.
//! Every layer (db, core, datalog, cli) returns AppError so callers only have
//! to match on one enum.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO / encoding
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// Raised while opening a store; the store is not usable afterwards.
    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Datastore is not open")]
    NotOpen,

    // ---------------------------
    // Datastore contract errors
    // ---------------------------
    /// General store error: bad smoothing rate, malformed import file,
    /// missing session list, export preconditions.
    #[error("Datastore error: {0}")]
    Datastore(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// Aggregate requested over a channel the schema does not know.
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn datastore<T: Into<String>>(msg: T) -> Self {
        AppError::Datastore(msg.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
