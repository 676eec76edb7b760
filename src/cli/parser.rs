use crate::config::FillMode;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface definition for telemstore
#[derive(Parser)]
#[command(
    name = "telemstore",
    version = env!("CARGO_PKG_VERSION"),
    about = "Store, query and export sparse multi-rate telemetry datalogs using SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the configuration file and the database
    Init,

    /// Import a datalog CSV file as a new session
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long, help = "Session name (default: file name)")]
        name: Option<String>,

        #[arg(long, default_value = "", help = "Free-text session notes")]
        notes: String,

        #[arg(long, value_enum, help = "Gap fill policy (overrides the config file)")]
        fill: Option<FillMode>,
    },

    /// Export a session as a datalog CSV file
    Export {
        session: i64,

        #[arg(long, value_name = "FILE", help = "Output file, '-' for stdout")]
        file: String,

        #[arg(long, short = 'f', help = "Overwrite an existing file without asking")]
        force: bool,
    },

    /// List sessions, newest first
    Sessions,

    /// Manage a single session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Delete a session with all of its samples
    Delete {
        session: i64,

        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// List known channels
    Channels {
        #[arg(long, help = "Only channels recorded in this session")]
        session: Option<i64>,

        #[arg(long, help = "Print as JSON")]
        json: bool,
    },

    /// Show or set a channel's smoothing rate
    Smoothing {
        channel: String,

        #[arg(allow_negative_numbers = true, help = "New rate; values below 1 are stored as 1")]
        rate: Option<i64>,
    },

    /// Query channel data as CSV on stdout
    Query {
        #[arg(long = "session", required = true, num_args = 1.., help = "Session ids to include")]
        sessions: Vec<i64>,

        #[arg(long = "channel", num_args = 1.., help = "Channels to select (default: all)")]
        channels: Vec<String>,

        #[arg(long = "where", value_name = "COND", help = "Condition like \"RPM > 9000\"; repeatable")]
        conditions: Vec<String>,

        #[arg(long = "or", help = "Join conditions with OR instead of AND")]
        any: bool,

        #[arg(long)]
        distinct: bool,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Average, minimum and maximum of a channel
    Stats {
        channel: String,

        #[arg(long = "session", num_args = 1.., help = "Restrict to these sessions")]
        sessions: Vec<i64>,

        #[arg(long = "include-zero", help = "Keep rows where the channel is exactly 0")]
        include_zero: bool,
    },

    /// List the laps of a session
    Laps { session: i64 },

    /// Average GPS position
    Center {
        #[arg(long = "session", num_args = 1.., help = "Restrict to these sessions")]
        sessions: Vec<i64>,
    },

    /// Print the internal log table
    Log,

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Rename a session or replace its notes; the date is set to now
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },
}
