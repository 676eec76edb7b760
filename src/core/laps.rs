//! Lap boundaries derived from the `CurrentLap`, `LapCount` and `LapTime`
//! channels.

use crate::core::registry::ChannelRegistry;
use crate::errors::AppResult;
use crate::models::Lap;
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;

pub const CURRENT_LAP: &str = "CurrentLap";
pub const LAP_COUNT: &str = "LapCount";
pub const LAP_TIME: &str = "LapTime";

/// True when the session's highest `LapCount` row carries both lap channels.
pub fn session_has_laps(conn: &Connection, registry: &ChannelRegistry, session_id: i64) -> AppResult<bool> {
    if !(registry.exists(CURRENT_LAP) && registry.exists(LAP_COUNT)) {
        return Ok(false);
    }

    let top: Option<(Option<f64>, Option<f64>)> = conn
        .query_row(
            "SELECT datapoint.\"LapCount\", datapoint.\"CurrentLap\"
             FROM sample JOIN datapoint ON datapoint.sample_id = sample.id
             WHERE sample.session_id = ?1
             ORDER BY datapoint.\"LapCount\" DESC LIMIT 1",
            [session_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    Ok(matches!(top, Some((Some(_), Some(_)))))
}

/// Laps of a session keyed by lap number, ascending.
///
/// Without lap data the whole session is lap 1. Otherwise there is one lap
/// per distinct `LapCount`, numbered `CurrentLap - 1`, plus a trailing
/// partial lap when samples exist past the last counted one. Negative lap
/// numbers are dropped.
pub fn get_laps(conn: &Connection, registry: &ChannelRegistry, session_id: i64) -> AppResult<BTreeMap<i64, Lap>> {
    let mut laps_map = BTreeMap::new();

    if !session_has_laps(conn, registry, session_id)? {
        laps_map.insert(1, Lap::new(1, session_id, None));
        return Ok(laps_map);
    }

    let lap_time = if registry.exists(LAP_TIME) {
        "datapoint.\"LapTime\""
    } else {
        "NULL"
    };
    let sql = format!(
        "SELECT sample.session_id, datapoint.\"CurrentLap\", {}
         FROM sample JOIN datapoint ON datapoint.sample_id = sample.id
         WHERE sample.session_id = ?1
         GROUP BY datapoint.\"LapCount\"
         ORDER BY datapoint.\"LapCount\" ASC",
        lap_time
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([session_id], |row| {
        let sid: i64 = row.get(0)?;
        let current: Option<f64> = row.get(1)?;
        let time: Option<f64> = row.get(2)?;
        let current = current.map(|c| c as i64).unwrap_or(1);
        Ok(Lap::new(current - 1, sid, time))
    })?;

    let mut laps = Vec::new();
    for r in rows {
        laps.push(r?);
    }

    if let Some(last) = laps.last().map(|l| l.lap) {
        let trailing = conn
            .query_row(
                "SELECT 1 FROM sample JOIN datapoint ON datapoint.sample_id = sample.id
                 WHERE sample.session_id = ?1 AND datapoint.\"CurrentLap\" > ?2 LIMIT 1",
                rusqlite::params![session_id, last],
                |_| Ok(()),
            )
            .optional()?;
        if trailing.is_some() {
            laps.push(Lap::new(last + 1, session_id, None));
        }
    }

    for lap in laps.into_iter().filter(|l| l.lap >= 0) {
        laps_map.insert(lap.lap, lap);
    }
    Ok(laps_map)
}
