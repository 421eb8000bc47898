#![forbid(unsafe_code)]

use crate::domain::{AddressSnapshot, CheckMode};
use crate::error::Error;
use crate::history::record::{
    CheckEvent, CurrentState, HistoryRecord, Metadata, SCHEMA_VERSION, Statistics,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read-only projection of the store for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub metadata: Metadata,
    pub current: CurrentState,
    pub statistics: Statistics,
    pub frequency_percentage: FrequencyPercentage,
    pub recent_activity: Vec<CheckEvent>,
    pub retained_events: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FrequencyPercentage {
    pub scheduled: f64,
    pub manual: f64,
    pub test: f64,
}

/// Durable, crash-safe owner of the on-disk history artifact. The sole
/// reader/writer of the backing file; every write goes through an atomic
/// temp-then-rename replace so concurrent readers never see a torn file.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    settings: config::History,
    record: HistoryRecord,
}

impl HistoryStore {
    /// Load the persisted record, or start fresh. An unparseable file is
    /// backed up with a timestamped name and replaced by an empty record;
    /// corruption is recovery, not failure.
    pub fn open(
        path: impl Into<PathBuf>,
        settings: config::History,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let record = if path.exists() {
            match Self::load_record(&path) {
                Ok(record) => record,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "history file unreadable, reinitializing");
                    if settings.backup_on_corruption {
                        Self::backup_corrupted(&path, now);
                    }
                    HistoryRecord::new(now)
                }
            }
        } else {
            HistoryRecord::new(now)
        };

        debug!(path = %path.display(), events = record.events.len(), "history store opened");
        Ok(Self {
            path,
            settings,
            record,
        })
    }

    fn load_record(path: &Path) -> Result<HistoryRecord, Error> {
        let bytes = fs::read(path)?;
        let record: HistoryRecord = serde_json::from_slice(&bytes)?;
        Ok(record)
    }

    fn backup_corrupted(path: &Path, now: DateTime<Utc>) {
        let backup = path.with_extension(format!("corrupted.{}.bak", now.timestamp()));
        match fs::copy(path, &backup) {
            Ok(_) => warn!(backup = %backup.display(), "corrupt history file backed up"),
            Err(err) => warn!(error = %err, "failed to back up corrupt history file"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &HistoryRecord {
        &self.record
    }

    /// Atomically persist the record, stamping `metadata.last_updated` with
    /// `now`. Saving twice with the same `now` and no intervening mutation
    /// writes byte-identical files.
    pub fn save(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.record.metadata.last_updated = now;

        let bytes = serde_json::to_vec_pretty(&self.record)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), "history persisted");
        Ok(())
    }

    pub fn last_public_ip(&self) -> Option<&str> {
        self.record
            .current
            .public_ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    }

    /// Whether `candidate` differs from the committed public address.
    /// Trimmed, case-insensitive comparison; a first-ever observation counts
    /// as a change.
    pub fn has_changed(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        match self.last_public_ip() {
            None => true,
            Some(previous) => !previous.eq_ignore_ascii_case(candidate),
        }
    }

    /// Append one check event and commit the outcome: update `current`,
    /// recompute statistics, bump the lifetime counter, run auto-cleanup, and
    /// persist. `ip_changed` is derived here, against the pre-update current
    /// value, so event and cycle share one comparison path.
    ///
    /// On persistence failure the in-memory record keeps the update and the
    /// error is returned; the caller decides whether to retry or accept the
    /// lost write.
    pub fn record_check(
        &mut self,
        snapshot: &AddressSnapshot,
        mode: CheckMode,
        notification_sent: bool,
        duration_seconds: f64,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        debug_assert!(mode.commits());

        let public_ip = snapshot
            .public
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        let ip_changed = public_ip.is_some_and(|ip| self.has_changed(ip));
        let previous_public_ip = if ip_changed {
            self.last_public_ip().map(str::to_owned)
        } else {
            None
        };

        self.record.events.push(CheckEvent {
            timestamp: snapshot.observed_at,
            public_ip: public_ip.map(str::to_owned),
            local_ip: snapshot.local.clone(),
            mode,
            ip_changed,
            notification_sent,
            execution_duration: round2(duration_seconds),
            previous_public_ip,
        });

        if let Some(ip) = public_ip {
            self.record.current.public_ip = Some(ip.to_owned());
            self.record.current.last_updated = Some(now);
        }
        if let Some(ip) = &snapshot.local {
            self.record.current.local_ip = Some(ip.clone());
        }
        if notification_sent {
            self.record.current.last_notification_sent = Some(now);
        }

        self.record.metadata.total_checks += 1;
        self.record.statistics.check_frequency.increment(mode);
        if ip_changed {
            self.record.statistics.total_ip_changes += 1;
            self.record.statistics.last_change_date = Some(now);
        }
        if notification_sent {
            self.record.statistics.total_notifications_sent += 1;
        }

        if self.settings.auto_cleanup {
            let removed = self.prune_by_age(self.settings.keep_days, now) + self.enforce_cap();
            if removed > 0 {
                debug!(removed, "pruned old history events");
            }
        }

        self.save(now)
    }

    pub fn summary(&self) -> HistorySummary {
        let record = &self.record;
        let total = record.metadata.total_checks;
        let frequency = record.statistics.check_frequency;
        let percent = |count: u64| {
            if total == 0 {
                0.0
            } else {
                round2(count as f64 / total as f64 * 100.0)
            }
        };

        let mut recent_activity: Vec<CheckEvent> =
            record.events.iter().rev().take(10).cloned().collect();
        recent_activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        HistorySummary {
            metadata: record.metadata.clone(),
            current: record.current.clone(),
            statistics: record.statistics.clone(),
            frequency_percentage: FrequencyPercentage {
                scheduled: percent(frequency.scheduled),
                manual: percent(frequency.manual),
                test: percent(frequency.test),
            },
            recent_activity,
            retained_events: record.events.len(),
        }
    }

    /// Events with a detected change within the last `days`, newest first.
    pub fn change_timeline(&self, days: u32, now: DateTime<Utc>) -> Vec<CheckEvent> {
        let cutoff = now - chrono::Duration::days(i64::from(days));
        let mut changes: Vec<CheckEvent> = self
            .record
            .events
            .iter()
            .filter(|event| event.ip_changed && event.timestamp >= cutoff)
            .cloned()
            .collect();
        changes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        changes
    }

    /// Drop events older than `keep_days`, always retaining the newest one.
    /// Returns the number removed. Lifetime counters and statistics are
    /// untouched; they aggregate over pruned events too.
    pub fn cleanup_old_records(&mut self, keep_days: u32, now: DateTime<Utc>) -> usize {
        self.prune_by_age(keep_days, now)
    }

    fn prune_by_age(&mut self, keep_days: u32, now: DateTime<Utc>) -> usize {
        if keep_days == 0 {
            return 0;
        }
        let cutoff = now - chrono::Duration::days(i64::from(keep_days));
        let events = &mut self.record.events;
        let before = events.len();
        if let Some(newest) = events.pop() {
            events.retain(|event| event.timestamp >= cutoff);
            events.push(newest);
        }
        before - events.len()
    }

    fn enforce_cap(&mut self) -> usize {
        let events = &mut self.record.events;
        let max = self.settings.max_records.max(1);
        if events.len() > max {
            let excess = events.len() - max;
            events.drain(..excess);
            excess
        } else {
            0
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn settings() -> config::History {
        config::History::default()
    }

    fn open_store(dir: &TempDir, settings: config::History) -> HistoryStore {
        let path = dir.path().join("ip_history.json");
        HistoryStore::open(path, settings, fixed_now()).unwrap()
    }

    fn snapshot(public: &str, at: DateTime<Utc>) -> AddressSnapshot {
        AddressSnapshot {
            local: Some("192.168.1.100".into()),
            public: Some(public.into()),
            observed_at: at,
        }
    }

    #[test]
    fn first_observation_counts_as_change() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir, settings());
        assert!(store.has_changed("203.0.113.1"));
        assert!(store.has_changed("anything"));
    }

    #[test]
    fn comparison_trims_and_ignores_case() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, settings());
        store
            .record_check(
                &snapshot("2001:DB8::1", fixed_now()),
                CheckMode::Scheduled,
                false,
                0.1,
                fixed_now(),
            )
            .unwrap();

        assert!(!store.has_changed("  2001:db8::1  "));
        assert!(store.has_changed("2001:db8::2"));
    }

    #[test]
    fn record_check_commits_current_and_statistics() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, settings());
        let now = fixed_now();

        store
            .record_check(&snapshot("203.0.113.1", now), CheckMode::Scheduled, true, 1.234, now)
            .unwrap();

        let record = store.record();
        assert_eq!(record.metadata.total_checks, 1);
        assert_eq!(record.current.public_ip.as_deref(), Some("203.0.113.1"));
        assert_eq!(record.current.local_ip.as_deref(), Some("192.168.1.100"));
        assert_eq!(record.current.last_notification_sent, Some(now));
        assert_eq!(record.statistics.total_ip_changes, 1);
        assert_eq!(record.statistics.total_notifications_sent, 1);
        assert_eq!(record.statistics.last_change_date, Some(now));
        assert_eq!(record.statistics.check_frequency.scheduled, 1);
        assert_eq!(record.events.len(), 1);
        assert_eq!(record.events[0].execution_duration, 1.23);
        assert_eq!(record.events[0].previous_public_ip, None);
    }

    #[test]
    fn change_records_previous_address() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, settings());
        let now = fixed_now();

        store
            .record_check(&snapshot("203.0.113.1", now), CheckMode::Scheduled, true, 0.1, now)
            .unwrap();
        store
            .record_check(&snapshot("203.0.113.2", now), CheckMode::Scheduled, true, 0.1, now)
            .unwrap();

        let event = store.record().events.last().unwrap();
        assert!(event.ip_changed);
        assert_eq!(event.previous_public_ip.as_deref(), Some("203.0.113.1"));
        assert_eq!(store.last_public_ip(), Some("203.0.113.2"));
    }

    #[test]
    fn unchanged_cycles_only_bump_the_counter() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, settings());
        let now = fixed_now();

        for _ in 0..3 {
            store
                .record_check(&snapshot("203.0.113.1", now), CheckMode::Scheduled, false, 0.1, now)
                .unwrap();
        }

        let record = store.record();
        assert_eq!(record.metadata.total_checks, 3);
        assert_eq!(record.statistics.total_ip_changes, 1);
        assert!(record.events.iter().skip(1).all(|e| !e.ip_changed));
    }

    #[test]
    fn failed_notification_does_not_count_as_sent() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, settings());
        let now = fixed_now();

        store
            .record_check(&snapshot("203.0.113.1", now), CheckMode::Manual, false, 0.1, now)
            .unwrap();

        let record = store.record();
        assert_eq!(record.statistics.total_notifications_sent, 0);
        assert_eq!(record.current.last_notification_sent, None);
        assert!(!record.events[0].notification_sent);
    }

    #[test]
    fn missing_public_address_never_overwrites_known_good_state() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, settings());
        let now = fixed_now();

        store
            .record_check(&snapshot("203.0.113.1", now), CheckMode::Scheduled, false, 0.1, now)
            .unwrap();
        let blank = AddressSnapshot {
            local: None,
            public: Some("   ".into()),
            observed_at: now,
        };
        store
            .record_check(&blank, CheckMode::Scheduled, false, 0.1, now)
            .unwrap();

        assert_eq!(store.last_public_ip(), Some("203.0.113.1"));
        let event = store.record().events.last().unwrap();
        assert_eq!(event.public_ip, None);
        assert!(!event.ip_changed);
    }

    #[test]
    fn cleanup_removes_stale_events_but_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let mut config = settings();
        config.auto_cleanup = false;
        let mut store = open_store(&dir, config);
        let now = fixed_now();

        // events spanning 40 days, oldest first
        for age in (0..40).rev() {
            let at = now - chrono::Duration::days(age);
            store
                .record_check(&snapshot("203.0.113.1", at), CheckMode::Scheduled, false, 0.1, at)
                .unwrap();
        }
        assert_eq!(store.record().events.len(), 40);

        let removed = store.cleanup_old_records(30, now);
        assert_eq!(removed, 9);
        assert_eq!(store.record().events.len(), 31);
        assert_eq!(store.record().metadata.total_checks, 40);
        assert!(
            store
                .record()
                .events
                .iter()
                .all(|e| e.timestamp >= now - chrono::Duration::days(30))
        );
    }

    #[test]
    fn cleanup_never_drops_the_single_newest_event() {
        let dir = TempDir::new().unwrap();
        let mut config = settings();
        config.auto_cleanup = false;
        let mut store = open_store(&dir, config);
        let now = fixed_now();
        let stale = now - chrono::Duration::days(90);

        store
            .record_check(&snapshot("203.0.113.1", stale), CheckMode::Scheduled, false, 0.1, stale)
            .unwrap();

        let removed = store.cleanup_old_records(30, now);
        assert_eq!(removed, 0);
        assert_eq!(store.record().events.len(), 1);
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let dir = TempDir::new().unwrap();
        let mut config = settings();
        config.max_records = 5;
        config.keep_days = 0;
        let mut store = open_store(&dir, config);
        let now = fixed_now();

        for i in 0..8 {
            let at = now + chrono::Duration::minutes(i);
            store
                .record_check(&snapshot("203.0.113.1", at), CheckMode::Scheduled, false, 0.1, at)
                .unwrap();
        }

        let events = &store.record().events;
        assert_eq!(events.len(), 5);
        assert_eq!(events[0].timestamp, now + chrono::Duration::minutes(3));
        assert_eq!(
            events.last().unwrap().timestamp,
            now + chrono::Duration::minutes(7)
        );
        assert_eq!(store.record().metadata.total_checks, 8);
    }

    #[test]
    fn corrupt_file_is_backed_up_and_reinitialized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ip_history.json");
        fs::write(&path, b"{ not json").unwrap();

        let store = HistoryStore::open(&path, settings(), fixed_now()).unwrap();
        assert_eq!(store.record().metadata.total_checks, 0);

        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains("corrupted") && name.ends_with(".bak"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            fs::read(dir.path().join(&backups[0])).unwrap(),
            b"{ not json"
        );
    }

    #[test]
    fn absent_file_is_not_persisted_until_first_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ip_history.json");
        let _store = HistoryStore::open(&path, settings(), fixed_now()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn save_load_save_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ip_history.json");
        let now = fixed_now();

        let mut store = HistoryStore::open(&path, settings(), now).unwrap();
        store
            .record_check(&snapshot("203.0.113.1", now), CheckMode::Manual, true, 0.5, now)
            .unwrap();
        let first = fs::read(&path).unwrap();

        let mut reloaded = HistoryStore::open(&path, settings(), now).unwrap();
        reloaded.save(now).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn change_timeline_filters_and_orders() {
        let dir = TempDir::new().unwrap();
        let mut config = settings();
        config.auto_cleanup = false;
        let mut store = open_store(&dir, config);
        let now = fixed_now();

        let ips = ["203.0.113.1", "203.0.113.1", "203.0.113.2", "203.0.113.3"];
        for (i, ip) in ips.iter().enumerate() {
            let at = now - chrono::Duration::days(3 - i as i64);
            store
                .record_check(&snapshot(ip, at), CheckMode::Scheduled, false, 0.1, at)
                .unwrap();
        }

        let timeline = store.change_timeline(7, now);
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0].public_ip.as_deref(), Some("203.0.113.3"));
        assert!(timeline.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    proptest! {
        #[test]
        fn statistics_stay_consistent_over_any_committed_sequence(
            checks in prop::collection::vec(
                (
                    prop_oneof![Just(CheckMode::Scheduled), Just(CheckMode::Manual)],
                    prop_oneof![
                        Just("203.0.113.1"),
                        Just("203.0.113.2"),
                        Just("198.51.100.7"),
                    ],
                    any::<bool>(),
                ),
                1..40,
            )
        ) {
            let dir = TempDir::new().unwrap();
            let mut config = settings();
            config.auto_cleanup = false;
            let mut store = open_store(&dir, config);
            let now = fixed_now();

            for (mode, ip, notified) in &checks {
                store
                    .record_check(&snapshot(ip, now), *mode, *notified, 0.1, now)
                    .unwrap();
            }

            let record = store.record();
            let changed = record.events.iter().filter(|e| e.ip_changed).count() as u64;
            let notified = record.events.iter().filter(|e| e.notification_sent).count() as u64;
            prop_assert_eq!(record.statistics.total_ip_changes, changed);
            prop_assert_eq!(record.statistics.total_notifications_sent, notified);
            prop_assert_eq!(
                record.statistics.check_frequency.total(),
                record.metadata.total_checks
            );
            prop_assert_eq!(record.metadata.total_checks, checks.len() as u64);
        }
    }
}
