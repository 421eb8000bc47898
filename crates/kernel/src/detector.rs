#![forbid(unsafe_code)]

use crate::domain::CheckMode;
use crate::history::HistoryStore;
use chrono::{DateTime, Utc};

/// The per-cycle verdict: did the address change, and does this mode warrant
/// a notification for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub ip_changed: bool,
    pub should_notify: bool,
    pub mode: CheckMode,
    pub timestamp: DateTime<Utc>,
}

/// The notification policy table. Scheduled notifies on change only, manual
/// always notifies, test never does.
pub fn should_notify(mode: CheckMode, ip_changed: bool) -> bool {
    match mode {
        CheckMode::Scheduled => ip_changed,
        CheckMode::Manual => true,
        CheckMode::Test => false,
    }
}

/// Compare a freshly probed public address against the store and apply the
/// mode policy. Read-only; committing the outcome is the caller's step.
pub fn evaluate(
    store: &HistoryStore,
    public_ip: &str,
    mode: CheckMode,
    observed_at: DateTime<Utc>,
) -> Evaluation {
    let ip_changed = store.has_changed(public_ip);
    Evaluation {
        ip_changed,
        should_notify: should_notify(mode, ip_changed),
        mode,
        timestamp: observed_at,
    }
}
