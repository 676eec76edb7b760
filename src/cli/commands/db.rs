use super::open_store;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{error, info, success};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Db {
        migrate,
        check,
        vacuum,
        info: show_info,
    } = cmd
    {
        // opening already applies pending migrations
        let store = open_store(cfg)?;

        //
        // 1) MIGRATE
        //
        if *migrate {
            let applied = store.migrate()?;
            info(format!("Recorded migrations: {}", store.applied_migrations()?.len()));
            success(format!("Migration completed ({} applied now).", applied.len()));
        }

        //
        // 2) INFO
        //
        if *show_info {
            let di = store.db_info()?;
            println!("File        : {}", cfg.database);
            println!("Size        : {:.2} MB", di.file_size as f64 / (1024.0 * 1024.0));
            println!("Sessions    : {}", di.sessions);
            println!("Samples     : {}", di.samples);
            println!("Channels    : {}", di.channels);
            println!("Data columns: {}", di.datapoint_columns);
        }

        //
        // 3) CHECK
        //
        if *check {
            let result = store.integrity_check()?;
            if result.len() == 1 && result[0] == "ok" {
                success("Integrity check passed.");
            } else {
                error(format!("Integrity check failed: {}", result.join("; ")));
            }
        }

        //
        // 4) VACUUM
        //
        if *vacuum {
            store.vacuum()?;
            success("Vacuum completed.");
        }
    }
    Ok(())
}
