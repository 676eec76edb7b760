use serde::{Deserialize, Serialize};

/// One logical recording. `date` is seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: i64,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub date: Option<f64>,
}

impl Session {
    pub fn new(session_id: i64, name: impl Into<String>, notes: impl Into<String>, date: Option<f64>) -> Self {
        Self {
            session_id,
            name: name.into(),
            notes: notes.into(),
            date,
        }
    }

    /// Creation time rendered in local time, for listings.
    pub fn date_display(&self) -> String {
        match self.date.and_then(crate::utils::time::from_unix_time) {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => "--".to_string(),
        }
    }
}
