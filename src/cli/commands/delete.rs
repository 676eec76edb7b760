use super::{ask_confirmation, open_store};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Delete { session, yes } = cmd {
        let mut store = open_store(cfg)?;
        let target = store
            .get_session_by_id(*session)?
            .ok_or_else(|| AppError::datastore(format!("No session with id {}", session)))?;

        let prompt = format!(
            "Delete session #{} '{}' and all of its samples? This action is irreversible.",
            target.session_id, target.name
        );
        if !*yes && !ask_confirmation(&prompt) {
            info("Operation cancelled.");
            return Ok(());
        }

        let deleted = store.delete_session(*session)?;
        success(format!(
            "Session #{} deleted ({} samples, {} channel rows).",
            session, deleted.samples, deleted.channels
        ));
    }
    Ok(())
}
