use super::open_store;
use crate::cli::parser::{Commands, SessionAction};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    match cmd {
        Commands::Sessions => list(cfg),
        Commands::Session {
            action: SessionAction::Update { id, name, notes },
        } => update(cfg, *id, name.as_deref(), notes.as_deref()),
        _ => Ok(()),
    }
}

fn list(cfg: &Config) -> AppResult<()> {
    let store = open_store(cfg)?;
    let sessions = store.get_sessions()?;
    if sessions.is_empty() {
        info("No sessions recorded.");
        return Ok(());
    }

    let mut table = Table::new(&["ID", "Name", "Date", "Samples", "Notes"]);
    for s in &sessions {
        let samples = store.get_session_record_count(s.session_id)?;
        table.add_row(vec![
            s.session_id.to_string(),
            s.name.clone(),
            s.date_display(),
            samples.to_string(),
            s.notes.clone(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}

fn update(cfg: &Config, id: i64, name: Option<&str>, notes: Option<&str>) -> AppResult<()> {
    let mut store = open_store(cfg)?;
    let mut session = store
        .get_session_by_id(id)?
        .ok_or_else(|| AppError::datastore(format!("No session with id {}", id)))?;

    if let Some(n) = name {
        session.name = n.to_string();
    }
    if let Some(n) = notes {
        session.notes = n.to_string();
    }
    store.update_session(&session)?;
    success(format!("Session #{} updated.", id));
    Ok(())
}
