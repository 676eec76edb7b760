use crate::config::Config;
use crate::core::Datastore;
use crate::db::log::ttlog;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use std::fs;
use std::path::Path;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory and file (an existing file is kept)
///  - the SQLite database with all migrations applied
pub fn handle(cfg: &Config) -> AppResult<()> {
    let conf_path = cfg.init_file()?;

    if let Some(parent) = Path::new(&cfg.database).parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    info(format!("Config file : {}", conf_path.display()));
    info(format!("Database    : {}", cfg.database));

    let store = Datastore::open(&cfg.database, cfg.store_options())?;

    if let Err(e) = ttlog(
        store.connection()?,
        "init",
        &cfg.database,
        "Database initialized",
    ) {
        warning(format!("Failed to write internal log: {}", e));
    }

    success(format!("Database initialized at {}", cfg.database));
    Ok(())
}
