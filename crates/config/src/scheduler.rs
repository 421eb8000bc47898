#![forbid(unsafe_code)]

use crate::schedule_time::ScheduleTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Scheduler {
    /// Time of day (UTC) for the daily scheduled check.
    pub daily_time: ScheduleTime,
}
