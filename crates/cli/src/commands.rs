#![forbid(unsafe_code)]

use crate::render;
use crate::signals::{SignalEvent, wait_for_signal};
use chrono::Utc;
use config::Config;
use flume::bounded;
use kernel::{CheckMode, HistoryStore};
use orchestrator::{CheckEngine, DiscordNotifier, Notifier, Services};
use std::pin::pin;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

fn open_engine(config: Config) -> anyhow::Result<CheckEngine> {
    config.validate()?;
    let services = Services::from_config(&config)?;
    Ok(CheckEngine::open(config, services)?)
}

/// Foreground daemon: one scheduled check per day until SIGINT or SIGTERM.
/// A signal cancels the scheduling loop; a cycle already in flight finishes
/// and commits before the process exits.
pub async fn daemon(config: Config) -> anyhow::Result<()> {
    let mut engine = open_engine(config)?;
    let cancel = CancellationToken::new();
    let (events_tx, events_rx) = bounded(8);

    let mut run = pin!(engine.run_until(cancel.clone()));
    loop {
        tokio::select! {
            res = &mut run => {
                res?;
                break;
            }
            err = wait_for_signal(&events_tx) => {
                tracing::error!(error = ?err, "Error while waiting for signal");
                err?;
            }
            res = events_rx.recv_async() => {
                let event = res?;
                debug!(?event, "Received signal event");
                match event {
                    SignalEvent::Interrupt | SignalEvent::Terminate => cancel.cancel(),
                }
            }
        }
    }

    info!("daemon stopped");
    Ok(())
}

pub async fn run_once(config: Config, mode: CheckMode) -> anyhow::Result<()> {
    let mut engine = open_engine(config)?;
    let report = engine.run_cycle(mode).await?;
    render::cycle_report(&report);
    Ok(())
}

pub fn status(config: Config, days: Option<u32>) -> anyhow::Result<()> {
    config.validate()?;
    let now = Utc::now();
    let store = HistoryStore::open(&config.history.file_path, config.history.clone(), now)?;
    render::status(&store.summary());
    if let Some(days) = days {
        render::timeline(&store.change_timeline(days, now), days);
    }
    Ok(())
}

/// Validate the configuration, then prove the webhook works by delivering a
/// test message through it.
pub async fn verify(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let notifier = DiscordNotifier::new(config.discord.clone())?;
    notifier
        .deliver("ipnotify: configuration test message")
        .await?;
    render::verified(&config);
    Ok(())
}
