use serde::{Deserialize, Serialize};

use crate::core::state::{Priority, Ticks};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub pid: String,
    pub arrival: Ticks,
    pub burst: Ticks,
    // Lower value wins; only Preemptive Priority looks at it
    pub priority: Priority,
}

impl Job {
    pub fn new(pid: impl Into<String>, arrival: Ticks, burst: Ticks, priority: Priority) -> Self {
        Self {
            pid: pid.into(),
            arrival,
            burst,
            priority,
        }
    }
}
