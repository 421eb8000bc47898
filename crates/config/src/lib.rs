#![forbid(unsafe_code)]

mod discord;
mod error;
mod history;
mod probe;
mod schedule_time;
mod scheduler;

pub use discord::{DISCORD_WEBHOOK_PREFIX, Discord};
pub use error::Error;
pub use history::History;
pub use probe::Probe;
pub use schedule_time::ScheduleTime;
pub use scheduler::Scheduler;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables prefixed with this override file values, with `__`
/// separating the section from the key (`IPNOTIFY_DISCORD__WEBHOOK_URL`).
pub const ENV_PREFIX: &str = "IPNOTIFY_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub discord: Discord,
    pub probe: Probe,
    pub history: History,
    pub scheduler: Scheduler,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file with environment overrides on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let config = Self::base()
            .merge(Toml::file(path.as_ref()))
            .merge(Self::env())
            .extract()?;
        Ok(config)
    }

    /// Load configuration from the environment alone.
    pub fn from_env() -> Result<Self, Error> {
        let config = Self::base().merge(Self::env()).extract()?;
        Ok(config)
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    /// Check everything that must hold before a cycle is allowed to run.
    /// Collects all violations rather than stopping at the first.
    pub fn validate(&self) -> Result<(), Error> {
        let mut errors = Vec::new();

        match &self.discord.webhook_url {
            None => errors.push("discord.webhook_url is not set".to_owned()),
            Some(url) if !url.as_str().starts_with(DISCORD_WEBHOOK_PREFIX) => {
                errors.push(format!(
                    "discord.webhook_url must start with {DISCORD_WEBHOOK_PREFIX}"
                ));
            }
            Some(_) => {}
        }

        if !self.discord.message_template.contains("{ip}") {
            errors.push("discord.message_template must contain an {ip} placeholder".to_owned());
        }

        if self.discord.retry_attempts == 0 {
            errors.push("discord.retry_attempts must be at least 1".to_owned());
        }

        if self.probe.services.is_empty() {
            errors.push("probe.services must list at least one service".to_owned());
        }

        if self.probe.retry_attempts == 0 {
            errors.push("probe.retry_attempts must be at least 1".to_owned());
        }

        if self.history.max_records == 0 {
            errors.push("history.max_records must be at least 1".to_owned());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Invalid(errors))
        }
    }
}
