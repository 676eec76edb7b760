//! First line of a datalog: one `"name"|"units"|min|max|sample_rate` field
//! per column, comma separated.

use crate::errors::{AppError, AppResult};
use crate::models::Channel;
use crate::utils::sql::is_reserved_column;

const BAD_METADATA: &str = "Unable to import datalog, bad metadata";

fn parse_field(index: usize, raw: &str) -> AppResult<Channel> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '"').collect();
    let parts: Vec<&str> = cleaned.split('|').collect();

    let bad = |what: &str| {
        AppError::datastore(format!("{}: column {} {}", BAD_METADATA, index + 1, what))
    };

    let [name, units, min, max, rate] = parts.as_slice() else {
        return Err(bad(&format!("has {} fields, expected 5", parts.len())));
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(bad("has no name"));
    }
    if is_reserved_column(name) {
        return Err(bad(&format!("uses the reserved name '{}'", name)));
    }
    let min: f64 = min.trim().parse().map_err(|_| bad("has a bad min"))?;
    let max: f64 = max.trim().parse().map_err(|_| bad("has a bad max"))?;
    let sample_rate: u32 = rate.trim().parse().map_err(|_| bad("has a bad sample rate"))?;

    Ok(Channel::new(name, units.trim(), min, max, sample_rate))
}

/// Parse a header line into channel definitions, in column order.
pub fn parse_header(line: &str) -> AppResult<Vec<Channel>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(AppError::datastore(format!("{}: empty header", BAD_METADATA)));
    }

    line.split(',')
        .enumerate()
        .map(|(i, raw)| parse_field(i, raw))
        .collect()
}

pub fn format_header_field(channel: &Channel) -> String {
    format!(
        "\"{}\"|\"{}\"|{}|{}|{}",
        channel.name, channel.units, channel.min, channel.max, channel.sample_rate
    )
}

/// Header line for `channels`, without the trailing newline.
pub fn format_header(channels: &[Channel]) -> String {
    channels
        .iter()
        .map(format_header_field)
        .collect::<Vec<_>>()
        .join(",")
}
