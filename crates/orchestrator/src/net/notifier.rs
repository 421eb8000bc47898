#![forbid(unsafe_code)]

use crate::error::Error;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Discord caps webhook message content at 2000 characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an arbitrary message. Ok means confirmed receipt.
    async fn deliver(&self, text: &str) -> Result<(), Error>;

    /// Format and deliver the address notification.
    async fn announce(&self, public_ip: &str) -> Result<(), Error>;
}

/// Posts messages to a Discord webhook with bounded fixed-delay retries and
/// 429 rate-limit handling.
#[derive(Debug)]
pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: Url,
    settings: config::Discord,
}

impl DiscordNotifier {
    pub fn new(settings: config::Discord) -> Result<Self, Error> {
        let webhook_url = settings.webhook_url.clone().ok_or(Error::WebhookMissing)?;
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("ipnotify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            webhook_url,
            settings,
        })
    }

    pub fn format_message(&self, public_ip: &str) -> Result<String, Error> {
        let public_ip = public_ip.trim();
        if public_ip.is_empty() {
            return Err(Error::Message("address is empty".to_owned()));
        }
        let message = self.settings.message_template.replace("{ip}", public_ip);
        if message.len() > MAX_MESSAGE_LENGTH {
            return Err(Error::Message(format!(
                "length {} exceeds the {MAX_MESSAGE_LENGTH} character limit",
                message.len()
            )));
        }
        Ok(message)
    }

    async fn post(&self, text: &str) -> Result<(), Error> {
        let payload = serde_json::json!({ "content": text });
        let mut last_error = String::new();

        for attempt in 1..=self.settings.retry_attempts {
            let result = self
                .client
                .post(self.webhook_url.clone())
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(response) if response.status() == StatusCode::NO_CONTENT => {
                    info!("discord notification delivered");
                    return Ok(());
                }
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = retry_after_seconds(&response).unwrap_or(1.0);
                    warn!(attempt, wait, "discord rate limit hit");
                    last_error = "rate limited".to_owned();
                    tokio::time::sleep(Duration::from_secs_f64(wait)).await;
                    continue;
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    last_error = format!("status {status}: {body}");
                    warn!(attempt, %status, "discord returned an error status");
                }
                Err(err) => {
                    last_error = err.to_string();
                    warn!(attempt, error = %err, "discord request failed");
                }
            }

            if attempt < self.settings.retry_attempts {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }

        Err(Error::DeliveryFailed(last_error))
    }
}

fn retry_after_seconds(response: &reqwest::Response) -> Option<f64> {
    response
        .headers()
        .get("Retry-After")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn deliver(&self, text: &str) -> Result<(), Error> {
        debug!(length = text.len(), "delivering webhook message");
        self.post(text).await
    }

    async fn announce(&self, public_ip: &str) -> Result<(), Error> {
        let message = self.format_message(public_ip)?;
        self.post(&message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn notifier() -> DiscordNotifier {
        let mut settings = config::Discord::default();
        settings.webhook_url = Some("https://discord.com/api/webhooks/1/t".parse().unwrap());
        DiscordNotifier::new(settings).unwrap()
    }

    #[test]
    fn message_uses_template() {
        let message = notifier().format_message("203.0.113.1").unwrap();
        assert_eq!(message, "Minecraft Server IP: 203.0.113.1:25565");
    }

    #[test]
    fn empty_address_is_rejected() {
        assert!(notifier().format_message("   ").is_err());
    }

    #[test]
    fn oversized_message_is_rejected() {
        let mut settings = config::Discord::default();
        settings.webhook_url = Some("https://discord.com/api/webhooks/1/t".parse().unwrap());
        settings.message_template = format!("{}{{ip}}", "x".repeat(MAX_MESSAGE_LENGTH));
        let notifier = DiscordNotifier::new(settings).unwrap();
        assert!(notifier.format_message("203.0.113.1").is_err());
    }

    #[test]
    fn missing_webhook_fails_construction() {
        let err = DiscordNotifier::new(config::Discord::default()).unwrap_err();
        assert!(matches!(err, Error::WebhookMissing));
    }
}
