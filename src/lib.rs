//! telemstore library root.
//! Exposes the datastore engine, the datalog codec and the CLI dispatcher.

pub mod cli;
pub mod config;
pub mod core;
pub mod datalog;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

pub use crate::core::Datastore;
pub use config::StoreOptions;
pub use errors::AppError;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    use cli::commands;

    match &cli.command {
        Commands::Init => commands::init::handle(cfg),
        Commands::Import { .. } => commands::import::handle(&cli.command, cfg),
        Commands::Export { .. } => commands::export::handle(&cli.command, cfg),
        Commands::Sessions | Commands::Session { .. } => commands::sessions::handle(&cli.command, cfg),
        Commands::Delete { .. } => commands::delete::handle(&cli.command, cfg),
        Commands::Channels { .. } | Commands::Smoothing { .. } => {
            commands::channels::handle(&cli.command, cfg)
        }
        Commands::Query { .. } => commands::query::handle(&cli.command, cfg),
        Commands::Stats { .. } | Commands::Laps { .. } | Commands::Center { .. } => {
            commands::stats::handle(&cli.command, cfg)
        }
        Commands::Log => commands::log::handle(cfg),
        Commands::Db { .. } => commands::db::handle(&cli.command, cfg),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    dispatch(&cli, &cfg)
}
