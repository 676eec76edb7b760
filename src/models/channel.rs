use serde::{Deserialize, Serialize};
use std::fmt;

/// Channels recorded on every tick; they lead every listing and export.
pub const SYSTEM_CHANNELS: [&str; 2] = ["Interval", "Utc"];

pub const INTERVAL_CHANNEL: &str = "Interval";

pub const DEFAULT_MIN: f64 = 0.0;
pub const DEFAULT_MAX: f64 = 100.0;
pub const DEFAULT_SAMPLE_RATE: u32 = 1;
pub const DEFAULT_SMOOTHING: u32 = 1;

fn default_max() -> f64 {
    DEFAULT_MAX
}
fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}
fn default_smoothing() -> u32 {
    DEFAULT_SMOOTHING
}

/// A named telemetry signal and its metadata.
///
/// `smoothing` is the number of samples interpolated over when a query asks
/// for smoothed data; `1` means the stored resolution is returned untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_smoothing")]
    pub smoothing: u32,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            name: String::new(),
            units: String::new(),
            min: DEFAULT_MIN,
            max: default_max(),
            sample_rate: default_sample_rate(),
            smoothing: default_smoothing(),
        }
    }
}

impl Channel {
    pub fn new(name: impl Into<String>, units: impl Into<String>, min: f64, max: f64, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            min,
            max,
            sample_rate,
            smoothing: DEFAULT_SMOOTHING,
        }
    }

    /// Width of the declared range, used to pick the winning definition
    /// when several sessions disagree about a channel.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_system(&self) -> bool {
        is_system_channel(&self.name)
    }

    /// Ticks between two samples of this channel at `max_sample_rate`.
    /// Channels with no declared rate are treated as sampled every tick.
    pub fn interval_ticks(&self, max_sample_rate: u32) -> u32 {
        if self.sample_rate == 0 {
            return 1;
        }
        (max_sample_rate / self.sample_rate).max(1)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub fn is_system_channel(name: &str) -> bool {
    SYSTEM_CHANNELS.contains(&name)
}

/// Move the system channels to the front, keeping their declared order and
/// the relative order of everything else.
pub fn pin_system_channels(channels: &mut Vec<Channel>) {
    for system in SYSTEM_CHANNELS.iter().rev() {
        if let Some(pos) = channels.iter().position(|c| c.name == *system) {
            let ch = channels.remove(pos);
            channels.insert(0, ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_channel_meta() {
        let ch: Channel = serde_json::from_str(r#"{"name":"RPM"}"#).unwrap();
        assert_eq!(ch.units, "");
        assert_eq!(ch.min, 0.0);
        assert_eq!(ch.max, 100.0);
        assert_eq!(ch.sample_rate, 1);
        assert_eq!(ch.smoothing, 1);
    }

    #[test]
    fn serde_round_trip_keeps_value() {
        let ch = Channel::new("Coolant", "F", 0.0, 300.0, 10);
        let json = serde_json::to_string(&ch).unwrap();
        let back: Channel = serde_json::from_str(&json).unwrap();
        assert_eq!(ch, back);
    }

    #[test]
    fn system_channels_are_pinned_in_order() {
        let mut list = vec![
            Channel::new("Alpha", "", 0.0, 1.0, 1),
            Channel::new("Utc", "ms", 0.0, 0.0, 1),
            Channel::new("Beta", "", 0.0, 1.0, 1),
            Channel::new("Interval", "ms", 0.0, 0.0, 1),
        ];
        pin_system_channels(&mut list);
        let names: Vec<&str> = list.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Interval", "Utc", "Alpha", "Beta"]);
    }

    #[test]
    fn interval_ticks_from_rate() {
        let ch = Channel::new("RPM", "", 0.0, 1.0, 10);
        assert_eq!(ch.interval_ticks(1000), 100);
        let unrated = Channel::new("X", "", 0.0, 1.0, 0);
        assert_eq!(unrated.interval_ticks(1000), 1);
    }
}
