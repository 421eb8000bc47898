#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a check cycle was triggered. The notification policy and whether the
/// cycle commits to history both hinge on this.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    Scheduled,
    Manual,
    Test,
}

impl CheckMode {
    /// Test-mode checks are evaluate-only and never touch the store.
    pub fn commits(self) -> bool {
        match self {
            Self::Scheduled | Self::Manual => true,
            Self::Test => false,
        }
    }
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
            Self::Test => "test",
        };
        f.write_str(name)
    }
}

/// One probe result. Produced by the address prober, consumed by the same
/// check cycle that requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSnapshot {
    pub local: Option<String>,
    pub public: Option<String>,
    pub observed_at: DateTime<Utc>,
}
