//! Session export back to the datalog format.
//!
//! Every stored sample is dense, but the file is sparse again: a channel's
//! value is written only on the ticks where the channel is due according to
//! its sample rate, counted from a sync point taken from the `Interval`
//! system channel. System channels are written on every row as integers.

use super::header::format_header_field;
use super::progress::{Progress, ProgressFn};
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::Channel;
use crate::models::channel::INTERVAL_CHANNEL;
use crate::utils::sql::quote_ident;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use log::{info, warn};
use rusqlite::Connection;
use std::io::Write;
use std::time::Instant;

struct ExportColumn {
    ticks: i64,
    system: bool,
}

/// Where the row walk is between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sync {
    /// Next row with an `Interval` value becomes the sync point.
    Unsynced,
    Synced(i64),
}

fn cell(value: Option<f64>, system: bool) -> String {
    match value {
        None => String::new(),
        Some(v) if system => (v as i64).to_string(),
        Some(v) => v.to_string(),
    }
}

/// Write session `session_id` to `out`. Returns the number of stored
/// samples walked, which is less than the session's record count only when
/// the progress callback cancelled the export.
pub fn export_session<W: Write>(
    conn: &Connection,
    session_id: i64,
    out: W,
    max_sample_rate: u32,
    progress_step: u32,
    progress: Option<ProgressFn<'_>>,
) -> AppResult<usize> {
    let started = Instant::now();
    let channels: Vec<Channel> = queries::load_channel_rows(conn, Some(session_id))?;

    let interval_index = channels
        .iter()
        .position(|c| c.name == INTERVAL_CHANNEL)
        .ok_or_else(|| {
            AppError::datastore("Cannot export: Interval channel missing from data")
        })?;
    if channels.iter().all(|c| c.is_system()) {
        return Err(AppError::datastore("Cannot export: No channels to output"));
    }

    let columns: Vec<ExportColumn> = channels
        .iter()
        .map(|c| ExportColumn {
            ticks: c.interval_ticks(max_sample_rate) as i64,
            system: c.is_system(),
        })
        .collect();

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(out);
    writer.write_record(channels.iter().map(format_header_field))?;

    let record_count = queries::session_record_count(conn, session_id)?.max(0) as usize;
    let mut progress = Progress::new(progress, progress_step);

    let select: Vec<String> = channels
        .iter()
        .map(|c| format!("datapoint.{}", quote_ident(&c.name)))
        .collect();
    let sql = format!(
        "SELECT {} FROM sample JOIN datapoint ON datapoint.sample_id = sample.id
         WHERE sample.session_id = ?1 ORDER BY sample.id ASC",
        select.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([session_id])?;

    let mut sync = Sync::Unsynced;
    let mut walked = 0usize;
    let mut written = 0usize;
    let mut resyncs = 0usize;
    let mut values: Vec<Option<f64>> = Vec::with_capacity(channels.len());

    while let Some(row) = rows.next()? {
        values.clear();
        for i in 0..channels.len() {
            values.push(row.get::<_, Option<f64>>(i)?);
        }

        match values[interval_index] {
            None => warn!("DataStore: Export: invalid row detected, skipping: {:?}", values),
            Some(interval) => {
                let current = interval as i64;
                loop {
                    let sync_point = match sync {
                        Sync::Synced(p) => p,
                        Sync::Unsynced => {
                            sync = Sync::Synced(current);
                            current
                        }
                    };

                    let mut sampled = false;
                    let line: Vec<String> = columns
                        .iter()
                        .zip(&values)
                        .map(|(col, value)| {
                            if col.system {
                                cell(*value, true)
                            } else if (current - sync_point).rem_euclid(col.ticks) == 0 {
                                sampled = true;
                                cell(*value, false)
                            } else {
                                String::new()
                            }
                        })
                        .collect();

                    if sampled {
                        writer.write_record(&line)?;
                        written += 1;
                        break;
                    }
                    warn!(
                        "DataStore: Export: Inconsistent interval detected at interval {}; re-syncing",
                        current
                    );
                    resyncs += 1;
                    sync = Sync::Unsynced;
                }
            }
        }

        walked += 1;
        if progress.update(walked, record_count) {
            info!("DataStore: export of session {} cancelled", session_id);
            break;
        }
    }
    progress.finish();
    writer.flush()?;

    info!(
        "DataStore: exported session {} ({} samples, {} rows, {} re-syncs) in {:.2?}",
        session_id,
        walked,
        written,
        resyncs,
        started.elapsed()
    );
    Ok(walked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_cells_are_integers() {
        assert_eq!(cell(Some(1500.0), true), "1500");
        assert_eq!(cell(Some(12.5), false), "12.5");
        assert_eq!(cell(None, false), "");
        assert_eq!(cell(None, true), "");
    }
}
