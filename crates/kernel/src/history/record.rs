#![forbid(unsafe_code)]

use crate::domain::CheckMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: &str = "1.0";

/// The persisted root aggregate. Serialized as pretty JSON with these exact
/// field names; unknown fields in an existing file are tolerated on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub metadata: Metadata,
    pub current: CurrentState,
    pub statistics: Statistics,
    #[serde(rename = "history")]
    pub events: Vec<CheckEvent>,
}

impl HistoryRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            metadata: Metadata {
                created_at: now,
                last_updated: now,
                version: SCHEMA_VERSION.to_owned(),
                total_checks: 0,
            },
            current: CurrentState::default(),
            statistics: Statistics::default(),
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub version: String,
    /// Lifetime counter of recorded checks. Independent of the event log
    /// length: pruning never decrements it.
    pub total_checks: u64,
}

/// What we currently believe the host's addresses are. The single source of
/// truth for change detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CurrentState {
    pub public_ip: Option<String>,
    pub local_ip: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_notification_sent: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    pub total_ip_changes: u64,
    pub total_notifications_sent: u64,
    pub last_change_date: Option<DateTime<Utc>>,
    pub check_frequency: CheckFrequency,
}

/// Per-mode tally of committed checks. A struct rather than a map so the
/// closed mode enum stays exhaustive.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckFrequency {
    pub scheduled: u64,
    pub manual: u64,
    pub test: u64,
}

impl CheckFrequency {
    pub fn increment(&mut self, mode: CheckMode) {
        match mode {
            CheckMode::Scheduled => self.scheduled += 1,
            CheckMode::Manual => self.manual += 1,
            CheckMode::Test => self.test += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.scheduled + self.manual + self.test
    }
}

/// One check, immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckEvent {
    pub timestamp: DateTime<Utc>,
    pub public_ip: Option<String>,
    pub local_ip: Option<String>,
    pub mode: CheckMode,
    pub ip_changed: bool,
    pub notification_sent: bool,
    /// Cycle duration in seconds, rounded to two decimals.
    pub execution_duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_public_ip: Option<String>,
}
