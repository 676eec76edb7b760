//! In-memory view of every channel the store knows about.

use crate::errors::{AppError, AppResult};
use crate::models::Channel;
use crate::models::channel::pin_system_channels;

/// Known channels keyed by name. Sessions may disagree about a channel's
/// range; the definition with the widest `max - min` span wins and its
/// min, max, sample rate and units replace the others.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from raw per-session channel rows.
    pub fn from_rows(rows: Vec<Channel>) -> Self {
        let mut registry = Self::new();
        registry.register(rows);
        registry
    }

    /// Merge `channels` into the registry by name.
    pub fn register(&mut self, channels: Vec<Channel>) {
        for incoming in channels {
            match self.channels.iter_mut().find(|c| c.name == incoming.name) {
                Some(known) => {
                    if incoming.span() > known.span() {
                        known.min = incoming.min;
                        known.max = incoming.max;
                        known.sample_rate = incoming.sample_rate;
                        known.units = incoming.units;
                    }
                }
                None => self.channels.push(incoming),
            }
        }
        self.channels.sort_by(|a, b| a.name.cmp(&b.name));
        pin_system_channels(&mut self.channels);
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }

    pub fn exists(&self, name: &str) -> bool {
        self.channels.iter().any(|c| c.name == name)
    }

    pub fn describe(&self, name: &str) -> AppResult<&Channel> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| AppError::UnknownChannel(name.to_string()))
    }

    /// Channels in listing order: system channels first, then by name.
    pub fn list(&self) -> &[Channel] {
        &self.channels
    }

    pub fn names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widest_span_wins() {
        let reg = ChannelRegistry::from_rows(vec![
            Channel::new("RPM", "rpm", 0.0, 6000.0, 10),
            Channel::new("RPM", "RPM", 0.0, 9000.0, 50),
            Channel::new("RPM", "x", 100.0, 200.0, 1),
        ]);
        assert_eq!(reg.len(), 1);
        let rpm = reg.describe("RPM").unwrap();
        assert_eq!(rpm.max, 9000.0);
        assert_eq!(rpm.sample_rate, 50);
        assert_eq!(rpm.units, "RPM");
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let reg = ChannelRegistry::new();
        assert!(!reg.exists("Speed"));
        assert!(matches!(reg.describe("Speed"), Err(AppError::UnknownChannel(_))));
    }

    #[test]
    fn names_are_exact_not_substring() {
        let reg = ChannelRegistry::from_rows(vec![Channel::new("LapCount", "", 0.0, 1.0, 1)]);
        assert!(!reg.exists("Lap"));
        assert!(reg.describe("Lap").is_err());
    }

    #[test]
    fn listing_pins_system_channels() {
        let reg = ChannelRegistry::from_rows(vec![
            Channel::new("Yaw", "", 0.0, 1.0, 1),
            Channel::new("Utc", "", 0.0, 0.0, 50),
            Channel::new("Accel", "", 0.0, 1.0, 1),
            Channel::new("Interval", "", 0.0, 0.0, 50),
        ]);
        assert_eq!(reg.names(), vec!["Interval", "Utc", "Accel", "Yaw"]);
    }

    #[test]
    fn register_merges_into_existing() {
        let mut reg = ChannelRegistry::from_rows(vec![Channel::new("TPS", "%", 0.0, 50.0, 10)]);
        reg.register(vec![
            Channel::new("TPS", "%", 0.0, 100.0, 25),
            Channel::new("Brake", "psi", 0.0, 2000.0, 25),
        ]);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.describe("TPS").unwrap().max, 100.0);
    }
}
