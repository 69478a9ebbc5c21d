// src/pipeline/relay.rs

//! One relay tick: probe, load, fetch, filter, save, enrich, deliver.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;

use crate::error::Result;
use crate::models::{Config, DeliveryReport, DeliveryStatus, FeedEntry, RunReport};
use crate::pipeline::compose::{compose_detailed, compose_summary};
use crate::pipeline::filter::{FilterRules, filter_entries};
use crate::services::{AvailabilityProbe, DetailScraper, FeedFetcher, SocialClient};
use crate::storage::{DedupStore, KvStore, open_store};
use crate::utils::http;

/// The relay with all collaborators wired up.
pub struct Relay {
    config: Arc<Config>,
    probe: AvailabilityProbe,
    feed: FeedFetcher,
    detail: DetailScraper,
    social: SocialClient,
    dedup: DedupStore,
    rules: FilterRules,
}

impl Relay {
    /// Wire a relay from configuration, an HTTP client and a storage backend.
    pub fn new(config: Arc<Config>, client: Client, store: Arc<dyn KvStore>) -> Result<Self> {
        Ok(Self {
            probe: AvailabilityProbe::new(client.clone()),
            feed: FeedFetcher::new(client.clone()),
            detail: DetailScraper::new(client.clone(), &config.detail)?,
            social: SocialClient::new(client, config.api_url(), &config.social),
            dedup: DedupStore::new(store, config.storage.key.clone()),
            rules: FilterRules::from_config(&config),
            config,
        })
    }

    /// Build the HTTP client and open the configured backend.
    pub async fn from_config(config: Arc<Config>) -> Result<Self> {
        let client = http::create_client(&config.http)?;
        let store = open_store(&config.storage).await?;
        Self::new(config, client, store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    /// Run one tick now.
    pub async fn run(&self) -> Result<RunReport> {
        self.run_at(Utc::now()).await
    }

    /// Run one tick with an explicit clock.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let relay = &self.config.relay;

        // Step 1: both hosts must answer before anything is read or written
        if let Some(reason) = self
            .probe
            .first_unavailable(&[&relay.service_url, &relay.status_page_url])
            .await
        {
            log::warn!("Skipping run: {}", reason);
            return Ok(RunReport::Skipped { reason });
        }

        // Step 2: dedup store
        let existing = self.dedup.load().await?;
        log::debug!("Loaded {} processed keys", existing.len());

        // Step 3: feed
        let entries = self.feed.fetch(&self.config.feed_url()).await?;

        // Step 4: filter
        let outcome = filter_entries(entries, &existing, &self.rules, now.timestamp_millis());
        log::info!(
            "{} entries to announce, {} keys processed in total",
            outcome.notify.len(),
            outcome.processed.len()
        );

        // Step 5: write back before any delivery starts
        if relay.test_mode {
            log::info!("Test mode: dedup store left untouched");
        } else {
            self.dedup.save(&outcome.processed).await?;
        }

        // Steps 6-7: enrich and deliver every entry concurrently
        let deliveries = join_all(outcome.notify.into_iter().map(|e| self.deliver(e))).await;

        let failed = deliveries.iter().filter(|d| d.is_failed()).count();
        if failed > 0 {
            log::warn!("{} of {} deliveries failed", failed, deliveries.len());
        }

        Ok(RunReport::Completed {
            deliveries,
            seen_total: outcome.processed.len(),
        })
    }

    /// Enrich, compose and post a single entry, capturing the outcome.
    async fn deliver(&self, entry: FeedEntry) -> DeliveryReport {
        let key = entry.key();
        let link = entry.link.clone();

        let message = if self.config.relay.enrich {
            match self.detail.fetch(&entry.link).await {
                Ok(detail) => compose_detailed(&entry, &detail, &self.config.message),
                Err(error) => {
                    log::error!("Failed to fetch detail page {}: {}", entry.link, error);
                    return DeliveryReport {
                        key,
                        link,
                        text: String::new(),
                        status: DeliveryStatus::Failed {
                            error: error.to_string(),
                        },
                    };
                }
            }
        } else {
            compose_summary(&entry, &self.config.message)
        };

        let status = if self.config.relay.test_mode {
            log::info!("Test mode, not posting {}:\n{}", key, message.text);
            DeliveryStatus::DryRun
        } else {
            match self.social.create_post(&message.text).await {
                Ok(note_id) => {
                    log::info!("Posted {} ({})", key, note_id.as_deref().unwrap_or("no id"));
                    DeliveryStatus::Posted { note_id }
                }
                Err(error) => {
                    log::error!("Failed to post {}: {}", key, error);
                    DeliveryStatus::Failed {
                        error: error.to_string(),
                    }
                }
            }
        };

        DeliveryReport {
            key: message.key,
            link: message.link,
            text: message.text,
            status,
        }
    }
}

/// Build a relay from configuration and run one tick.
pub async fn run_relay(config: Arc<Config>) -> Result<RunReport> {
    let relay = Relay::from_config(config).await?;
    relay.run().await
}
