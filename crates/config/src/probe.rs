#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;
use url::Url;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Probe {
    /// Public-IP echo services, tried in order until one answers.
    pub services: Vec<Url>,

    /// Attempts per service before moving on to the next one.
    pub retry_attempts: u32,

    /// Fixed delay between attempts.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub retry_delay: Duration,

    /// Per-request timeout.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub timeout: Duration,
}

impl Default for Probe {
    fn default() -> Self {
        let services = [
            "https://api.ipify.org",
            "https://icanhazip.com",
            "https://ident.me",
            "https://checkip.amazonaws.com",
        ]
        .iter()
        .filter_map(|url| Url::parse(url).ok())
        .collect();

        Self {
            services,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }
}
