#![forbid(unsafe_code)]

use crate::error::Error;
use std::net::IpAddr;
use tracing::{debug, warn};
use url::Url;

/// Raw addresses from one probe. The engine stamps the observation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbedAddresses {
    pub local: Option<String>,
    pub public: Option<String>,
}

#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self) -> Result<ProbedAddresses, Error>;
}

/// Looks up the public address via a list of plain-text IP echo services and
/// the LAN address via the local routing table. A missing local address is
/// tolerated; exhausting every public service fails the probe.
pub struct HttpProber {
    client: reqwest::Client,
    settings: config::Probe,
}

impl HttpProber {
    pub fn new(settings: config::Probe) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("ipnotify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, settings })
    }

    async fn fetch_public(&self) -> Result<String, Error> {
        let mut last_error = String::from("no services configured");

        for service in &self.settings.services {
            for attempt in 1..=self.settings.retry_attempts {
                match self.query_service(service).await {
                    Ok(ip) => {
                        debug!(%service, %ip, "public address resolved");
                        return Ok(ip);
                    }
                    Err(err) => {
                        warn!(%service, attempt, error = %err, "public address lookup attempt failed");
                        last_error = err.to_string();
                        if attempt < self.settings.retry_attempts {
                            tokio::time::sleep(self.settings.retry_delay).await;
                        }
                    }
                }
            }
        }

        Err(Error::ProbeFailed(last_error))
    }

    async fn query_service(&self, service: &Url) -> Result<String, Error> {
        let response = self.client.get(service.clone()).send().await?;
        if !response.status().is_success() {
            return Err(Error::ProbeFailed(format!(
                "{service} returned status {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        let ip: IpAddr = body
            .trim()
            .parse()
            .map_err(|_| Error::ProbeFailed(format!("{service} returned an invalid address")))?;
        Ok(ip.to_string())
    }

    fn local_address() -> Option<String> {
        match local_ip_address::local_ip() {
            Ok(ip) => Some(ip.to_string()),
            Err(err) => {
                debug!(error = %err, "local address unavailable");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self) -> Result<ProbedAddresses, Error> {
        let public = self.fetch_public().await?;
        Ok(ProbedAddresses {
            local: Self::local_address(),
            public: Some(public),
        })
    }
}
