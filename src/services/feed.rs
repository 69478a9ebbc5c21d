// src/services/feed.rs

//! Status page feed fetcher.
//!
//! Fetches the RSS (or Atom) feed and flattens it into `FeedEntry` values in
//! feed order.

use feed_rs::parser;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::FeedEntry;
use crate::utils::{http, strip_html};

/// Fetches and parses the status feed.
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch and parse the feed at `url`.
    pub async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let bytes = http::fetch_bytes(&self.client, url)
            .await
            .map_err(|e| AppError::feed(url, e))?;
        let entries = parse_feed(&bytes).map_err(|e| AppError::feed(url, e))?;
        log::info!("Fetched {} feed entries from {}", entries.len(), url);
        Ok(entries)
    }
}

/// Parse a feed document into entries.
pub fn parse_feed(bytes: &[u8]) -> std::result::Result<Vec<FeedEntry>, parser::ParseFeedError> {
    let feed = parser::parse(bytes)?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let description = entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body))
                .map(|d| strip_html(&d))
                .unwrap_or_default();
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let published = entry
                .published
                .or(entry.updated)
                .map(|t| t.timestamp_millis())
                .unwrap_or(0);
            let author = entry.authors.first().map(|a| a.name.clone());
            let categories = entry.categories.into_iter().map(|c| c.term).collect();
            let enclosures = entry
                .media
                .iter()
                .flat_map(|m| m.content.iter())
                .filter_map(|c| c.url.as_ref().map(|u| u.to_string()))
                .collect();

            FeedEntry {
                title,
                description,
                link,
                published,
                author,
                categories,
                enclosures,
            }
        })
        .collect();

    Ok(entries)
}
