//! One handler per subcommand. Each receives the parsed command and the
//! effective configuration.

pub mod channels;
pub mod db;
pub mod delete;
pub mod export;
pub mod import;
pub mod init;
pub mod log;
pub mod query;
pub mod sessions;
pub mod stats;

use crate::config::Config;
use crate::core::Datastore;
use crate::errors::AppResult;
use crate::ui::messages::warning;
use std::io::{self, Write};

pub(crate) fn open_store(cfg: &Config) -> AppResult<Datastore> {
    Datastore::open(&cfg.database, cfg.store_options())
}

/// Ask a yes/no question on the terminal; anything but y/yes is a no.
pub(crate) fn ask_confirmation(prompt: &str) -> bool {
    warning(prompt);
    eprint!("Confirm [y/N]: ");
    let _ = io::stderr().flush();

    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        matches!(s.trim().to_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

pub(crate) fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "--".to_string())
}
