use serde::{Deserialize, Serialize};

/// A lap derived from the lap-counting channels; never stored.
/// `lap_time` is `None` for a synthesized lap (whole session, or the
/// trailing partial lap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub lap: i64,
    pub session_id: i64,
    pub lap_time: Option<f64>,
}

impl Lap {
    pub fn new(lap: i64, session_id: i64, lap_time: Option<f64>) -> Self {
        Self {
            lap,
            session_id,
            lap_time,
        }
    }
}
