use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One synchronized tick of a live recording: the channel values that were
/// observed together. Channels absent from `values` are stored as NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: impl Into<String>, value: f64) -> Self {
        self.values.insert(channel.into(), value);
        self
    }

    pub fn set(&mut self, channel: impl Into<String>, value: f64) {
        self.values.insert(channel.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
