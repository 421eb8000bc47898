#![forbid(unsafe_code)]

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] config::Error),

    #[error("history error: {0}")]
    History(#[from] kernel::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("public address lookup failed: {0}")]
    ProbeFailed(String),

    #[error("webhook delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("discord webhook url is not configured")]
    WebhookMissing,

    #[error("message rejected: {0}")]
    Message(String),
}
