//! Status lines for the CLI. They go to stderr so that commands writing
//! data (`query`, `export -`) keep stdout clean.

use std::fmt;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

const FG_BLUE: &str = "\x1b[34m";
const FG_GREEN: &str = "\x1b[32m";
const FG_YELLOW: &str = "\x1b[33m";
const FG_RED: &str = "\x1b[31m";

fn emit<T: fmt::Display>(color: &str, tag: &str, msg: T) {
    eprintln!("{}{}{}{} {}", color, BOLD, tag, RESET, msg);
}

pub fn info<T: fmt::Display>(msg: T) {
    emit(FG_BLUE, "info:", msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    emit(FG_GREEN, "ok:", msg);
}

pub fn warning<T: fmt::Display>(msg: T) {
    emit(FG_YELLOW, "warning:", msg);
}

pub fn error<T: fmt::Display>(msg: T) {
    emit(FG_RED, "error:", msg);
}

/// Section title above a table.
pub fn header<T: fmt::Display>(msg: T) {
    println!("{}{}{}{}", FG_BLUE, BOLD, msg, RESET);
}
