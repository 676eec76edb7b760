use super::{fmt_opt, open_store};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::header;
use crate::utils::table::Table;

fn scope(sessions: &[i64]) -> Option<&[i64]> {
    if sessions.is_empty() { None } else { Some(sessions) }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    match cmd {
        Commands::Stats {
            channel,
            sessions,
            include_zero,
        } => {
            let store = open_store(cfg)?;
            let exclude_zero = !*include_zero;
            let sessions = scope(sessions);

            let avg = store.get_channel_average(channel, sessions, exclude_zero)?;
            let min = store.get_channel_min(channel, sessions, &[], exclude_zero)?;
            let max = store.get_channel_max(channel, sessions, &[], exclude_zero)?;

            header(channel);
            let mut table = Table::new(&["Avg", "Min", "Max"]);
            table.add_row(vec![fmt_opt(avg), fmt_opt(min.value), fmt_opt(max.value)]);
            print!("{}", table.render());
        }
        Commands::Laps { session } => {
            let store = open_store(cfg)?;
            let laps = store.get_laps(*session)?;

            let mut table = Table::new(&["Lap", "Lap time"]);
            for lap in laps.values() {
                table.add_row(vec![lap.lap.to_string(), fmt_opt(lap.lap_time)]);
            }
            print!("{}", table.render());
        }
        Commands::Center { sessions } => {
            let store = open_store(cfg)?;
            let (lat, lon) = store.get_location_center(scope(sessions))?;
            println!("{}, {}", fmt_opt(lat), fmt_opt(lon));
        }
        _ => {}
    }
    Ok(())
}
