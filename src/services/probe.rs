// src/services/probe.rs

//! Availability probe for upstream hosts.

use reqwest::Client;

/// Outcome of probing one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Available,
    Unavailable { reason: String },
}

/// Issues HEAD requests to decide whether a run should proceed.
pub struct AvailabilityProbe {
    client: Client,
}

impl AvailabilityProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Probe a single URL. Transport errors and non-success codes both mean
    /// unavailable; neither is surfaced as an error.
    pub async fn check(&self, url: &str) -> ProbeResult {
        match self.client.head(url).send().await {
            Ok(response) if response.status().is_success() => ProbeResult::Available,
            Ok(response) => ProbeResult::Unavailable {
                reason: format!("{} answered {}", url, response.status()),
            },
            Err(error) => ProbeResult::Unavailable {
                reason: format!("{} unreachable: {}", url, error),
            },
        }
    }

    /// Probe each URL in order, stopping at the first failure.
    ///
    /// Returns the reason of the first unavailable host, or `None` when all
    /// answered.
    pub async fn first_unavailable(&self, urls: &[&str]) -> Option<String> {
        for url in urls {
            match self.check(url).await {
                ProbeResult::Available => log::debug!("Probe ok: {}", url),
                ProbeResult::Unavailable { reason } => return Some(reason),
            }
        }
        None
    }
}
