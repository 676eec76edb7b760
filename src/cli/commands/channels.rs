use super::open_store;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    match cmd {
        Commands::Channels { session, json } => {
            let store = open_store(cfg)?;
            let channels = match session {
                Some(id) => store.get_channel_list(Some(*id))?,
                None => store.channel_list().to_vec(),
            };

            if *json {
                println!("{}", serde_json::to_string_pretty(&channels)?);
                return Ok(());
            }
            if channels.is_empty() {
                info("No channels known.");
                return Ok(());
            }

            let mut table = Table::new(&["Name", "Units", "Min", "Max", "Rate", "Smoothing"]);
            for c in &channels {
                table.add_row(vec![
                    c.name.clone(),
                    c.units.clone(),
                    c.min.to_string(),
                    c.max.to_string(),
                    c.sample_rate.to_string(),
                    c.smoothing.to_string(),
                ]);
            }
            print!("{}", table.render());
        }
        Commands::Smoothing { channel, rate } => {
            let mut store = open_store(cfg)?;
            if let Some(r) = rate {
                store.set_channel_smoothing(channel, *r)?;
                success(format!(
                    "Smoothing for {} set to {}.",
                    channel,
                    store.get_channel_smoothing(channel)?
                ));
            } else {
                println!("{}", store.get_channel_smoothing(channel)?);
            }
        }
        _ => {}
    }
    Ok(())
}
