//! `Datastore`: the session-oriented telemetry store.
//!
//! Owns the connection, the merged channel registry and the engine
//! options. Every multi-statement write runs in a single transaction; the
//! registry is rebuilt after any write that can change channel metadata.

use crate::config::StoreOptions;
use crate::core::dataset::{self, DataSet};
use crate::core::filter::Filter;
use crate::core::laps;
use crate::core::registry::ChannelRegistry;
use crate::datalog::{self, ImportReport, ProgressFn};
use crate::db::initialize::init_db;
use crate::db::log::{LogEntry, load_log, ttlog};
use crate::db::pool::DbPool;
use crate::db::queries::{self, DeletedRows};
use crate::db::stats::{self, Aggregate, AggregateRow, DbInfo};
use crate::db::{migrate, schema};
use crate::errors::{AppError, AppResult};
use crate::models::channel::DEFAULT_SMOOTHING;
use crate::models::{Channel, Lap, Sample, Session};
use crate::utils::time::unix_time_now;
use log::{debug, info};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

pub struct Datastore {
    pool: Option<DbPool>,
    channels: ChannelRegistry,
    options: StoreOptions,
}

impl Datastore {
    /// A closed store; call [`open_db`](Self::open_db) before use.
    pub fn new(options: StoreOptions) -> Self {
        Self {
            pool: None,
            channels: ChannelRegistry::new(),
            options,
        }
    }

    /// Open (creating if needed) the store at `path` and apply pending
    /// migrations. A migration failure is returned as
    /// [`AppError::Migration`] and no store is produced.
    pub fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> AppResult<Self> {
        let mut store = Self::new(options);
        store.open_db(path)?;
        Ok(store)
    }

    pub fn open_in_memory(options: StoreOptions) -> AppResult<Self> {
        let mut store = Self::new(options);
        store.attach(DbPool::in_memory()?)?;
        Ok(store)
    }

    /// Open `path`, closing whatever was open before.
    pub fn open_db<P: AsRef<Path>>(&mut self, path: P) -> AppResult<()> {
        if self.is_open() {
            self.close();
        }
        self.attach(DbPool::new(path.as_ref())?)
    }

    fn attach(&mut self, pool: DbPool) -> AppResult<()> {
        init_db(&pool.conn)?;
        self.channels = ChannelRegistry::from_rows(queries::load_channel_rows(&pool.conn, None)?);
        debug!("DataStore: opened with {} known channels", self.channels.len());
        self.pool = Some(pool);
        Ok(())
    }

    pub fn close(&mut self) {
        if self.pool.take().is_some() {
            debug!("DataStore: closed");
        }
        self.channels.clear();
    }

    pub fn is_open(&self) -> bool {
        self.pool.is_some()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// File backing the store; `None` when closed or in memory.
    pub fn path(&self) -> Option<&Path> {
        self.pool.as_ref().and_then(|p| p.path())
    }

    fn pool(&self) -> AppResult<&DbPool> {
        self.pool.as_ref().ok_or(AppError::NotOpen)
    }

    fn pool_mut(&mut self) -> AppResult<&mut DbPool> {
        self.pool.as_mut().ok_or(AppError::NotOpen)
    }

    pub fn connection(&self) -> AppResult<&Connection> {
        Ok(&self.pool()?.conn)
    }

    fn populate_channel_list(&mut self) -> AppResult<()> {
        let rows = queries::load_channel_rows(self.connection()?, None)?;
        self.channels = ChannelRegistry::from_rows(rows);
        Ok(())
    }

    // ---------------------------
    // Channels
    // ---------------------------

    pub fn channel_exists(&self, name: &str) -> bool {
        self.channels.exists(name)
    }

    /// Merged view: one entry per channel name, widest range wins.
    pub fn channel_list(&self) -> &[Channel] {
        self.channels.list()
    }

    /// Stored channel rows, optionally for one session; one row per distinct
    /// definition, system channels first.
    pub fn get_channel_list(&self, session_id: Option<i64>) -> AppResult<Vec<Channel>> {
        queries::load_channel_rows(self.connection()?, session_id)
    }

    pub fn get_channel(&self, name: &str) -> AppResult<&Channel> {
        self.channels
            .describe(name)
            .map_err(|_| AppError::datastore(format!("Unknown channel: {}", name)))
    }

    /// Smoothing below 1 is stored as 1.
    pub fn set_channel_smoothing(&mut self, name: &str, smoothing: i64) -> AppResult<()> {
        if !self.channels.exists(name) {
            return Err(AppError::datastore(format!("Unknown channel: {}", name)));
        }
        let smoothing = smoothing.clamp(DEFAULT_SMOOTHING as i64, u32::MAX as i64) as u32;
        queries::set_channel_smoothing(self.connection()?, name, smoothing)?;
        self.populate_channel_list()
    }

    pub fn get_channel_smoothing(&self, name: &str) -> AppResult<u32> {
        if !self.channels.exists(name) {
            return Err(AppError::datastore(format!("Unknown channel: {}", name)));
        }
        queries::get_channel_smoothing(self.connection()?, name)?.ok_or_else(|| {
            AppError::datastore(format!("Unable to retrieve smoothing for channel: {}", name))
        })
    }

    // ---------------------------
    // Sessions
    // ---------------------------

    pub fn create_session(&mut self, name: &str, notes: &str) -> AppResult<i64> {
        self.init_session(name, &[], notes)
    }

    /// Create a session and declare the channels it will record. Channels
    /// not seen before get their datapoint columns here.
    pub fn init_session(&mut self, name: &str, channels: &[Channel], notes: &str) -> AppResult<i64> {
        let extra = self.options.extra_index_channels.clone();
        let session_id = self.pool_mut()?.with_transaction(|tx| {
            schema::extend_datalog_channels(tx, channels, &extra)?;
            let session_id = queries::insert_session(tx, name, notes, unix_time_now())?;
            queries::insert_session_channels(tx, session_id, channels)?;
            ttlog(
                tx,
                "create_session",
                &session_id.to_string(),
                &format!("Created session '{}' with {} channels", name, channels.len()),
            )?;
            Ok(session_id)
        })?;

        if !channels.is_empty() {
            self.populate_channel_list()?;
        }
        info!("DataStore: Created session with ID: {}", session_id);
        Ok(session_id)
    }

    pub fn get_sessions(&self) -> AppResult<Vec<Session>> {
        queries::list_sessions(self.connection()?)
    }

    pub fn get_session_by_id(&self, session_id: i64) -> AppResult<Option<Session>> {
        queries::get_session(self.connection()?, session_id)
    }

    /// Store the session's name and notes; the date is reset to now.
    pub fn update_session(&mut self, session: &Session) -> AppResult<()> {
        let n = queries::update_session(self.connection()?, session, unix_time_now())?;
        if n == 0 {
            return Err(AppError::datastore(format!(
                "No session with id {}",
                session.session_id
            )));
        }
        Ok(())
    }

    /// Remove a session with its samples, datapoints and channel rows.
    pub fn delete_session(&mut self, session_id: i64) -> AppResult<DeletedRows> {
        let deleted = self.pool_mut()?.with_transaction(|tx| {
            let deleted = queries::delete_session_rows(tx, session_id)?;
            ttlog(
                tx,
                "delete_session",
                &session_id.to_string(),
                &format!(
                    "Deleted session ({} samples, {} datapoints)",
                    deleted.samples, deleted.datapoints
                ),
            )?;
            Ok(deleted)
        })?;
        self.populate_channel_list()?;
        info!("DataStore: Deleted session {}", session_id);
        Ok(deleted)
    }

    pub fn get_session_record_count(&self, session_id: i64) -> AppResult<i64> {
        queries::session_record_count(self.connection()?, session_id)
    }

    // ---------------------------
    // Writes
    // ---------------------------

    /// Insert one aligned record, `record[i]` belonging to `channels[i]`,
    /// committed on its own.
    pub fn insert_record(&mut self, record: &[Option<f64>], channels: &[Channel], session_id: i64) -> AppResult<i64> {
        if record.len() != channels.len() {
            return Err(AppError::datastore(format!(
                "Record has {} values for {} channels",
                record.len(),
                channels.len()
            )));
        }
        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        self.pool_mut()?.with_transaction(|tx| {
            let sample_id = queries::insert_sample(tx, session_id)?;
            queries::insert_datapoint(tx, sample_id, &names, record)?;
            Ok(sample_id)
        })
    }

    /// Queue one live sample. Nothing is visible until [`commit`](Self::commit);
    /// on error the whole pending batch is rolled back.
    pub fn insert_sample_nocommit(&mut self, sample: &Sample, session_id: i64) -> AppResult<i64> {
        let conn = self.connection()?;
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN")?;
        }

        let insert = || -> AppResult<i64> {
            let sample_id = queries::insert_sample(conn, session_id)?;
            let names: Vec<&str> = sample.values.keys().map(String::as_str).collect();
            let values: Vec<Option<f64>> = sample.values.values().map(|v| Some(*v)).collect();
            queries::insert_datapoint(conn, sample_id, &names, &values)?;
            Ok(sample_id)
        };
        let result = insert();

        if result.is_err() && !conn.is_autocommit() {
            if let Err(rb) = conn.execute_batch("ROLLBACK") {
                log::error!("DataStore: rollback failed: {}", rb);
            }
        }
        result
    }

    /// Commit samples queued by `insert_sample_nocommit`.
    pub fn commit(&mut self) -> AppResult<()> {
        let conn = self.connection()?;
        if conn.is_autocommit() {
            return Ok(());
        }
        if let Err(e) = conn.execute_batch("COMMIT") {
            if let Err(rb) = conn.execute_batch("ROLLBACK") {
                log::error!("DataStore: rollback failed: {}", rb);
            }
            return Err(e.into());
        }
        Ok(())
    }

    // ---------------------------
    // Datalog import / export
    // ---------------------------

    pub fn import_datalog(
        &mut self,
        path: &Path,
        name: &str,
        notes: &str,
        progress: Option<ProgressFn<'_>>,
    ) -> AppResult<ImportReport> {
        let options = self.options.clone();
        let report = datalog::import_datalog(self.pool_mut()?, path, name, notes, &options, progress)?;
        self.populate_channel_list()?;
        Ok(report)
    }

    /// Write a session as a datalog. Returns the number of samples walked;
    /// the progress callback can stop the export early by returning `true`.
    pub fn export_session<W: Write>(
        &self,
        session_id: i64,
        out: W,
        progress: Option<ProgressFn<'_>>,
    ) -> AppResult<usize> {
        datalog::export_session(
            self.connection()?,
            session_id,
            out,
            self.options.max_sample_rate,
            self.options.progress_step,
            progress,
        )
    }

    // ---------------------------
    // Queries
    // ---------------------------

    pub fn query<S: AsRef<str>>(
        &self,
        sessions: &[i64],
        channels: &[S],
        filter: Option<&Filter>,
        distinct: bool,
    ) -> AppResult<DataSet> {
        dataset::query(self.connection()?, &self.channels, sessions, channels, filter, distinct)
    }

    fn aggregate(
        &self,
        aggregate: Aggregate,
        channel: &str,
        sessions: Option<&[i64]>,
        extra_channels: &[String],
        exclude_zero: bool,
    ) -> AppResult<AggregateRow> {
        if !self.channels.exists(channel) {
            return Err(AppError::InvalidChannel(channel.to_string()));
        }
        if let Some(unknown) = extra_channels.iter().find(|c| !self.channels.exists(c)) {
            return Err(AppError::InvalidChannel(unknown.clone()));
        }
        stats::channel_aggregate(
            self.connection()?,
            aggregate,
            channel,
            sessions,
            extra_channels,
            exclude_zero,
        )
    }

    /// `None` when no rows match, including for unknown session ids.
    pub fn get_channel_average(&self, channel: &str, sessions: Option<&[i64]>, exclude_zero: bool) -> AppResult<Option<f64>> {
        Ok(self
            .aggregate(Aggregate::Avg, channel, sessions, &[], exclude_zero)?
            .value)
    }

    pub fn get_channel_min(
        &self,
        channel: &str,
        sessions: Option<&[i64]>,
        extra_channels: &[String],
        exclude_zero: bool,
    ) -> AppResult<AggregateRow> {
        self.aggregate(Aggregate::Min, channel, sessions, extra_channels, exclude_zero)
    }

    pub fn get_channel_max(
        &self,
        channel: &str,
        sessions: Option<&[i64]>,
        extra_channels: &[String],
        exclude_zero: bool,
    ) -> AppResult<AggregateRow> {
        self.aggregate(Aggregate::Max, channel, sessions, extra_channels, exclude_zero)
    }

    /// Mean of the non-zero GPS fixes; `(0, 0)` when the store has no
    /// Latitude/Longitude channels.
    pub fn get_location_center(&self, sessions: Option<&[i64]>) -> AppResult<(Option<f64>, Option<f64>)> {
        if !(self.channels.exists("Latitude") && self.channels.exists("Longitude")) {
            return Ok((Some(0.0), Some(0.0)));
        }
        stats::location_center(self.connection()?, sessions)
    }

    pub fn session_has_laps(&self, session_id: i64) -> AppResult<bool> {
        laps::session_has_laps(self.connection()?, &self.channels, session_id)
    }

    pub fn get_laps(&self, session_id: i64) -> AppResult<BTreeMap<i64, Lap>> {
        laps::get_laps(self.connection()?, &self.channels, session_id)
    }

    // ---------------------------
    // Maintenance
    // ---------------------------

    /// Apply migrations added since the store was opened. Returns the
    /// versions applied.
    pub fn migrate(&self) -> AppResult<Vec<&'static str>> {
        migrate::run_pending_migrations(self.connection()?)
    }

    pub fn applied_migrations(&self) -> AppResult<Vec<String>> {
        migrate::applied_migrations(self.connection()?)
    }

    pub fn integrity_check(&self) -> AppResult<Vec<String>> {
        stats::integrity_check(self.connection()?)
    }

    pub fn vacuum(&self) -> AppResult<()> {
        stats::vacuum(self.connection()?)
    }

    pub fn db_info(&self) -> AppResult<DbInfo> {
        stats::db_info(self.connection()?, self.path())
    }

    pub fn audit_log(&self) -> AppResult<Vec<LogEntry>> {
        load_log(self.connection()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Datastore {
        Datastore::open_in_memory(StoreOptions::default()).unwrap()
    }

    fn chans() -> Vec<Channel> {
        vec![
            Channel::new("Interval", "ms", 0.0, 0.0, 1000),
            Channel::new("RPM", "rpm", 0.0, 9000.0, 10),
        ]
    }

    #[test]
    fn closed_store_reports_not_open() {
        let mut ds = Datastore::new(StoreOptions::default());
        assert!(!ds.is_open());
        assert!(matches!(ds.get_sessions(), Err(AppError::NotOpen)));
        assert!(matches!(ds.create_session("x", ""), Err(AppError::NotOpen)));
    }

    #[test]
    fn init_session_registers_channels() {
        let mut ds = store();
        let sid = ds.init_session("Practice", &chans(), "dry").unwrap();
        assert!(ds.channel_exists("RPM"));
        assert_eq!(ds.get_channel("RPM").unwrap().max, 9000.0);
        assert_eq!(ds.get_channel_list(Some(sid)).unwrap()[0].name, "Interval");
        assert!(matches!(ds.get_channel("Speed"), Err(AppError::Datastore(_))));
    }

    #[test]
    fn smoothing_is_clamped_and_checked() {
        let mut ds = store();
        ds.init_session("s", &chans(), "").unwrap();
        ds.set_channel_smoothing("RPM", 0).unwrap();
        assert_eq!(ds.get_channel_smoothing("RPM").unwrap(), 1);
        ds.set_channel_smoothing("RPM", 4).unwrap();
        assert_eq!(ds.get_channel_smoothing("RPM").unwrap(), 4);
        assert!(matches!(
            ds.set_channel_smoothing("Nope", 2),
            Err(AppError::Datastore(_))
        ));
    }

    #[test]
    fn nocommit_samples_appear_after_commit() {
        let mut ds = store();
        let sid = ds.init_session("live", &chans(), "").unwrap();
        for i in 0..3 {
            let sample = Sample::new()
                .with("Interval", (i * 10) as f64)
                .with("RPM", 1000.0 + i as f64);
            ds.insert_sample_nocommit(&sample, sid).unwrap();
        }
        assert!(!ds.connection().unwrap().is_autocommit());
        ds.commit().unwrap();
        assert_eq!(ds.get_session_record_count(sid).unwrap(), 3);
    }

    #[test]
    fn failed_nocommit_rolls_back_batch() {
        let mut ds = store();
        let sid = ds.init_session("live", &chans(), "").unwrap();
        ds.insert_sample_nocommit(&Sample::new().with("RPM", 1.0), sid)
            .unwrap();
        let bad = Sample::new().with("NoSuchColumn", 1.0);
        assert!(ds.insert_sample_nocommit(&bad, sid).is_err());
        ds.commit().unwrap();
        assert_eq!(ds.get_session_record_count(sid).unwrap(), 0);
    }

    #[test]
    fn insert_record_checks_width() {
        let mut ds = store();
        let sid = ds.init_session("s", &chans(), "").unwrap();
        assert!(ds.insert_record(&[Some(1.0)], &chans(), sid).is_err());
        ds.insert_record(&[Some(0.0), Some(2500.0)], &chans(), sid)
            .unwrap();
        assert_eq!(ds.get_session_record_count(sid).unwrap(), 1);
    }

    #[test]
    fn location_center_without_gps_is_origin() {
        let ds = store();
        assert_eq!(
            ds.get_location_center(None).unwrap(),
            (Some(0.0), Some(0.0))
        );
    }

    #[test]
    fn update_session_keeps_id() {
        let mut ds = store();
        let sid = ds.create_session("old", "").unwrap();
        let mut s = ds.get_session_by_id(sid).unwrap().unwrap();
        s.name = "new".into();
        s.notes = "wet".into();
        ds.update_session(&s).unwrap();
        let back = ds.get_session_by_id(sid).unwrap().unwrap();
        assert_eq!(back.name, "new");
        assert_eq!(back.notes, "wet");
        assert!(back.date.is_some());
    }
}
