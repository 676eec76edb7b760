use super::open_store;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::utils::table::Table;

pub fn handle(cfg: &Config) -> AppResult<()> {
    let store = open_store(cfg)?;
    let entries = store.audit_log()?;
    if entries.is_empty() {
        info("The log is empty.");
        return Ok(());
    }

    let mut table = Table::new(&["Date", "Operation", "Target", "Message"]);
    for e in entries {
        table.add_row(vec![e.date, e.operation, e.target, e.message]);
    }
    print!("{}", table.render());
    Ok(())
}
