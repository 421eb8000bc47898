#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;
use url::Url;

/// Every Discord webhook lives under this prefix; anything else is rejected
/// at startup.
pub const DISCORD_WEBHOOK_PREFIX: &str = "https://discord.com/api/webhooks/";

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Discord {
    /// Webhook endpoint to post notifications to. Required.
    pub webhook_url: Option<Url>,

    /// Message template; `{ip}` is replaced with the public address.
    pub message_template: String,

    /// Delivery attempts before the cycle gives up on notifying.
    pub retry_attempts: u32,

    /// Fixed delay between delivery attempts.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub retry_delay: Duration,

    /// Per-request timeout.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub timeout: Duration,
}

impl Default for Discord {
    fn default() -> Self {
        Self {
            webhook_url: None,
            message_template: "Minecraft Server IP: {ip}:25565".to_owned(),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }
}
