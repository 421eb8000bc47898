#![forbid(unsafe_code)]

use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::net::{DiscordNotifier, HttpProber, Notifier, Prober};
use crate::schedule;
use config::Config;
use kernel::{AddressSnapshot, CheckMode, HistoryStore};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct Services {
    pub prober: Box<dyn Prober>,
    pub notifier: Box<dyn Notifier>,
    pub clock: Box<dyn Clock>,
}

impl Services {
    /// Wire up the production collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            prober: Box::new(HttpProber::new(config.probe.clone())?),
            notifier: Box::new(DiscordNotifier::new(config.discord.clone())?),
            clock: Box::new(SystemClock),
        })
    }
}

/// Outcome of one check cycle, as reported to the front end.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub mode: CheckMode,
    pub public_ip: String,
    pub local_ip: Option<String>,
    pub previous_public_ip: Option<String>,
    pub ip_changed: bool,
    pub should_notify: bool,
    pub notification_sent: bool,
    /// False when the event could not be persisted (or in test mode).
    pub recorded: bool,
    pub duration_seconds: f64,
}

/// Drives one check cycle end to end: probe, evaluate against the history
/// store, notify if the mode policy says so, and commit the outcome. Also
/// hosts the daily scheduling loop for daemon mode.
pub struct CheckEngine {
    config: Config,
    services: Services,
    store: HistoryStore,
}

impl CheckEngine {
    pub fn open(config: Config, services: Services) -> Result<Self, Error> {
        let now = services.clock.now();
        let store = HistoryStore::open(&config.history.file_path, config.history.clone(), now)?;
        Ok(Self {
            config,
            services,
            store,
        })
    }

    /// Run exactly one cycle. A probe failure aborts the cycle before any
    /// state is touched; notification and persistence failures are folded
    /// into the report instead of propagating.
    pub async fn run_cycle(&mut self, mode: CheckMode) -> Result<CycleReport, Error> {
        let started = self.services.clock.now();
        info!(%mode, "check cycle started");

        let addresses = self.services.prober.probe().await?;
        let Some(public_ip) = addresses
            .public
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_owned)
        else {
            return Err(Error::ProbeFailed(
                "probe returned no public address".to_owned(),
            ));
        };

        let observed_at = self.services.clock.now();
        let evaluation = kernel::evaluate(&self.store, &public_ip, mode, observed_at);
        let previous_public_ip = if evaluation.ip_changed {
            self.store.last_public_ip().map(str::to_owned)
        } else {
            None
        };

        if evaluation.ip_changed {
            info!(
                previous = previous_public_ip.as_deref().unwrap_or("none"),
                current = %public_ip,
                "public address changed"
            );
        } else {
            debug!(current = %public_ip, "public address unchanged");
        }

        let mut notification_sent = false;
        if evaluation.should_notify {
            match self.services.notifier.announce(&public_ip).await {
                Ok(()) => notification_sent = true,
                Err(err) => warn!(error = %err, "notification delivery failed"),
            }
        }

        let finished = self.services.clock.now();
        let duration_seconds = (finished - started).num_milliseconds() as f64 / 1000.0;

        let snapshot = AddressSnapshot {
            local: addresses.local.clone(),
            public: Some(public_ip.clone()),
            observed_at,
        };

        let mut recorded = false;
        if mode.commits() {
            match self
                .store
                .record_check(&snapshot, mode, notification_sent, duration_seconds, finished)
            {
                Ok(()) => recorded = true,
                Err(err) => {
                    error!(error = %err, "failed to persist check history; result not durable");
                }
            }
        }

        Ok(CycleReport {
            mode,
            public_ip,
            local_ip: addresses.local,
            previous_public_ip,
            ip_changed: evaluation.ip_changed,
            should_notify: evaluation.should_notify,
            notification_sent,
            recorded,
            duration_seconds: (duration_seconds * 100.0).round() / 100.0,
        })
    }

    /// Read-only access to the store (useful for tests).
    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Daemon loop: sleep until the next daily tick, run a scheduled cycle,
    /// repeat. Cycle failures are logged and the loop continues. Cancellation
    /// is only observed between cycles, so a running cycle drains gracefully.
    pub async fn run_until(&mut self, cancel: CancellationToken) -> Result<(), Error> {
        let daily_time = self.config.scheduler.daily_time;
        loop {
            let now = self.services.clock.now();
            let next = schedule::next_occurrence(daily_time, now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(next_run = %next, "waiting for next scheduled check");

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                _ = self.services.clock.sleep(wait) => {
                    match self.run_cycle(CheckMode::Scheduled).await {
                        Ok(report) => info!(
                            ip = %report.public_ip,
                            changed = report.ip_changed,
                            notified = report.notification_sent,
                            "scheduled check complete"
                        ),
                        Err(err) => error!(error = %err, "scheduled check failed"),
                    }
                }
            }
        }
        Ok(())
    }
}
