use super::{ask_confirmation, open_store};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;

/// An existing file is only replaced with `--force` or after confirmation.
fn ensure_writable(path: &Path, force: bool) -> AppResult<()> {
    if !path.exists() || force {
        return Ok(());
    }
    if ask_confirmation(&format!("The file '{}' already exists. Overwrite?", path.display())) {
        info("Existing file will be overwritten.");
        Ok(())
    } else {
        Err(AppError::from(io::Error::other(
            "Export cancelled: existing file not overwritten",
        )))
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        session,
        file,
        force,
    } = cmd
    {
        let store = open_store(cfg)?;
        if store.get_session_by_id(*session)?.is_none() {
            return Err(AppError::datastore(format!("No session with id {}", session)));
        }

        if file == "-" {
            let stdout = io::stdout();
            store.export_session(*session, stdout.lock(), None)?;
            return Ok(());
        }

        let path = Path::new(file);
        ensure_writable(path, *force)?;
        let out = BufWriter::new(File::create(path)?);
        let samples = match store.export_session(*session, out, None) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(path);
                return Err(e);
            }
        };
        success(format!(
            "Exported session #{} ({} samples) to {}",
            session,
            samples,
            path.display()
        ));
    }
    Ok(())
}
