use super::open_store;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::dataset::SESSION_ID_COLUMN;
use crate::core::filter::{Comparison, Filter, FilterValue};
use crate::errors::{AppError, AppResult};
use csv::WriterBuilder;
use std::io;

const OPERATOR_CHARS: [char; 4] = ['<', '>', '=', '!'];

/// Split `"Channel op value"` into its parts. The channel is everything
/// before the first operator character, so names may contain spaces.
pub(crate) fn parse_condition(expr: &str) -> AppResult<(String, Comparison, FilterValue)> {
    let bad = || AppError::datastore(format!("Invalid condition '{}', expected e.g. \"RPM > 9000\"", expr));

    let op_start = expr.find(OPERATOR_CHARS).ok_or_else(bad)?;
    let rest = &expr[op_start..];
    let op_len = rest
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(rest.len());

    let channel = expr[..op_start].trim();
    let op = Comparison::parse(&rest[..op_len]).ok_or_else(bad)?;
    let raw = rest[op_len..].trim();
    if channel.is_empty() || raw.is_empty() {
        return Err(bad());
    }

    let value = if let Ok(i) = raw.parse::<i64>() {
        FilterValue::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        FilterValue::Real(f)
    } else {
        FilterValue::Text(raw.trim_matches(|c| c == '\'' || c == '"').to_string())
    };
    Ok((channel.to_string(), op, value))
}

fn build_filter(conditions: &[String], any: bool) -> AppResult<Option<Filter>> {
    if conditions.is_empty() {
        return Ok(None);
    }
    let mut filter = Filter::new();
    if any {
        filter = filter.or_();
    }
    for c in conditions {
        let (channel, op, value) = parse_condition(c)?;
        filter = filter.compare(&channel, op, value);
    }
    Ok(Some(filter))
}

fn cell(label: &str, value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if label == SESSION_ID_COLUMN => (v as i64).to_string(),
        Some(v) => v.to_string(),
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Query {
        sessions,
        channels,
        conditions,
        any,
        distinct,
        limit,
    } = cmd
    {
        let filter = build_filter(conditions, *any)?;
        if let Some(f) = &filter {
            log::info!("query filter: {}", f.describe());
        }

        let store = open_store(cfg)?;
        let mut data = store.query(sessions.as_slice(), channels.as_slice(), filter.as_ref(), *distinct)?;
        let labels = data.channels().to_vec();
        let records = data.fetch_records(*limit)?;

        let stdout = io::stdout();
        let mut writer = WriterBuilder::new().from_writer(stdout.lock());
        writer.write_record(&labels)?;
        for record in records {
            writer.write_record(labels.iter().zip(record).map(|(l, v)| cell(l, v)))?;
        }
        writer.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spaced_condition() {
        let (ch, op, v) = parse_condition("RPM > 9000").unwrap();
        assert_eq!(ch, "RPM");
        assert_eq!(op, Comparison::Gt);
        assert_eq!(v, FilterValue::Integer(9000));
    }

    #[test]
    fn parses_compact_and_two_char_operators() {
        let (ch, op, v) = parse_condition("Oil Temp>=90.5").unwrap();
        assert_eq!(ch, "Oil Temp");
        assert_eq!(op, Comparison::GtEq);
        assert_eq!(v, FilterValue::Real(90.5));
        assert_eq!(parse_condition("LapCount != 1").unwrap().1, Comparison::Neq);
    }

    #[test]
    fn rejects_missing_parts() {
        assert!(parse_condition("RPM 9000").is_err());
        assert!(parse_condition("> 9000").is_err());
        assert!(parse_condition("RPM >").is_err());
        assert!(parse_condition("RPM =< 3").is_err());
    }

    #[test]
    fn or_flag_joins_with_or() {
        let f = build_filter(&["A > 1".into(), "B < 2".into()], true)
            .unwrap()
            .unwrap();
        assert_eq!(f.to_string(), "datapoint.A > ? OR datapoint.B < ?");
    }
}
