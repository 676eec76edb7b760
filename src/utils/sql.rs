//! SQL identifier handling.
//!
//! Channel names become column names in the `datapoint` table, so they are
//! spliced into statement text. They are never escaped by hand elsewhere:
//! everything goes through [`quote_ident`]. Values are always bound.

/// Trim the name, drop any double quotes and wrap it in double quotes so it
/// is safe to use as a column or table identifier.
pub fn quote_ident(name: &str) -> String {
    let cleaned: String = name.trim().chars().filter(|c| *c != '"').collect();
    format!("\"{}\"", cleaned)
}

/// The bare identifier SQLite will store for `name` (quotes stripped).
pub fn bare_ident(name: &str) -> String {
    name.trim().chars().filter(|c| *c != '"').collect()
}

/// Structural columns of `datapoint`; a channel may not share their names.
pub const RESERVED_COLUMNS: [&str; 2] = ["id", "sample_id"];

/// True when `name` would land on one of [`RESERVED_COLUMNS`]. SQLite
/// compares column names case-insensitively.
pub fn is_reserved_column(name: &str) -> bool {
    let bare = bare_ident(name);
    RESERVED_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(&bare))
}

/// `?,?,?` with `n` placeholders.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}
