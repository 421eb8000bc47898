#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct History {
    /// Path to the JSON history artifact.
    pub file_path: PathBuf,

    /// Retention window for events; 0 disables age-based cleanup.
    pub keep_days: u32,

    /// Hard cap on the event log length, oldest evicted first.
    pub max_records: usize,

    /// Run cleanup automatically after every committed check.
    pub auto_cleanup: bool,

    /// Keep a timestamped copy of an unparseable history file before
    /// reinitializing.
    pub backup_on_corruption: bool,
}

impl Default for History {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from("data/ip_history.json"),
            keep_days: 30,
            max_records: 1000,
            auto_cleanup: true,
            backup_on_corruption: true,
        }
    }
}
