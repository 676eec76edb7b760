use super::desparsify::{Desparsifier, ImportWarning};
use super::header::parse_header;
use super::progress::{Progress, ProgressFn};
use crate::config::StoreOptions;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::{queries, schema};
use crate::errors::{AppError, AppResult};
use crate::utils::time::unix_time_now;
use csv::ReaderBuilder;
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

/// Outcome of a successful import. Skipped lines are listed in `warnings`;
/// they never abort the import.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub session_id: i64,
    pub records: usize,
    pub warnings: Vec<ImportWarning>,
}

fn open_datalog(path: &Path) -> AppResult<File> {
    File::open(path)
        .map_err(|e| AppError::datastore(format!("Unable to open file {}: {}", path.display(), e)))
}

/// Data lines in the file, header excluded.
fn count_data_lines(path: &Path) -> AppResult<usize> {
    let reader = BufReader::new(open_datalog(path)?);
    let mut lines = 0usize;
    for line in reader.split(b'\n') {
        line?;
        lines += 1;
    }
    Ok(lines.saturating_sub(1))
}

/// Import the datalog at `path` as a new session.
///
/// The header extends the schema, then the session, its channel rows and
/// every desparsified record are written in one transaction: a failure
/// leaves the store exactly as it was.
pub fn import_datalog(
    pool: &mut DbPool,
    path: &Path,
    name: &str,
    notes: &str,
    options: &StoreOptions,
    progress: Option<ProgressFn<'_>>,
) -> AppResult<ImportReport> {
    let started = Instant::now();
    let total_lines = count_data_lines(path)?;

    let mut reader = BufReader::new(open_datalog(path)?);
    let mut header = String::new();
    reader.read_line(&mut header)?;
    let channels = parse_header(&header)?;

    let csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut progress = Progress::new(progress, options.progress_step);

    let report = pool.with_transaction(|tx| {
        schema::extend_datalog_channels(tx, &channels, &options.extra_index_channels)?;

        let session_id = queries::insert_session(tx, name, notes, unix_time_now())?;
        queries::insert_session_channels(tx, session_id, &channels)?;

        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        let mut records =
            Desparsifier::new(csv_reader.into_records(), channels.len(), options.fill_mode);

        let mut count = 0usize;
        while let Some(record) = records.next() {
            let record = record?;
            let sample_id = queries::insert_sample(tx, session_id)?;
            queries::insert_datapoint(tx, sample_id, &names, &record)?;
            count += 1;
            progress.update(records.lines_read(), total_lines);
        }
        progress.finish();

        let warnings = records.into_warnings();
        ttlog(
            tx,
            "import",
            &session_id.to_string(),
            &format!(
                "Imported {} ({} records, {} channels, {} warnings)",
                path.display(),
                count,
                channels.len(),
                warnings.len()
            ),
        )?;

        Ok(ImportReport {
            session_id,
            records: count,
            warnings,
        })
    })?;

    if !report.warnings.is_empty() {
        warn!(
            "DataStore: import of {} skipped {} lines",
            path.display(),
            report.warnings.len()
        );
    }
    info!(
        "DataStore: imported {} records into session {} in {:.2?}",
        report.records,
        report.session_id,
        started.elapsed()
    );
    Ok(report)
}
