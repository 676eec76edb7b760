//! Time helpers: session timestamps are stored as float seconds since the
//! Unix epoch.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Current time as float seconds since the Unix epoch.
pub fn unix_time_now() -> f64 {
    unix_time(Utc::now())
}

pub fn unix_time<Tz: TimeZone>(dt: DateTime<Tz>) -> f64 {
    dt.timestamp_micros() as f64 / 1_000_000.0
}

pub fn unix_time_millis<Tz: TimeZone>(dt: DateTime<Tz>) -> f64 {
    unix_time(dt) * 1000.0
}

/// Convert stored epoch seconds back to local time, if representable.
pub fn from_unix_time(secs: f64) -> Option<DateTime<Local>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    Local.timestamp_opt(whole as i64, nanos).single()
}
