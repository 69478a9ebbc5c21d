// src/pipeline/filter.rs

//! Filter pipeline.
//!
//! Decides which feed entries are announced and grows the processed set.
//! Steps, per entry and in feed order:
//!
//! 1. drop the link equal to the status page root (not a specific report)
//! 2. drop titles naming neither the service nor the platform
//! 3. drop keys already processed (skipped in test mode)
//! 4. record the key as processed (skipped in test mode)
//! 5. drop entries older than the recency window
//!
//! An entry that is too old is still recorded, so it is never announced
//! later either.

use url::Url;

use crate::models::{Config, FeedEntry};
use crate::storage::ProcessedSet;

/// Inputs of the filter that come from configuration.
#[derive(Debug, Clone)]
pub struct FilterRules {
    pub status_page_url: String,
    pub service_name: String,
    pub platform_name: String,
    pub recency_window_ms: i64,
    pub test_mode: bool,
}

impl FilterRules {
    /// The status page URL is normalized the way feed links are, so the
    /// root check can compare strings exactly.
    pub fn from_config(config: &Config) -> Self {
        let status_page_url = Url::parse(&config.relay.status_page_url)
            .map(String::from)
            .unwrap_or_else(|_| config.relay.status_page_url.clone());

        Self {
            status_page_url,
            service_name: config.relay.service_name.clone(),
            platform_name: config.relay.platform_name.clone(),
            recency_window_ms: config.recency_window_ms(),
            test_mode: config.relay.test_mode,
        }
    }

    /// Case-sensitive match against either configured name.
    fn is_relevant(&self, title: &str) -> bool {
        let matches = |name: &str| !name.is_empty() && title.contains(name);
        matches(&self.service_name) || matches(&self.platform_name)
    }
}

/// Result of filtering one feed snapshot.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Set to persist: the existing keys plus every newly recorded key
    pub processed: ProcessedSet,
    /// Entries to announce, in feed order
    pub notify: Vec<FeedEntry>,
}

/// Run the filter pipeline over `entries`.
pub fn filter_entries(
    entries: Vec<FeedEntry>,
    existing: &ProcessedSet,
    rules: &FilterRules,
    now_ms: i64,
) -> FilterOutcome {
    let cutoff = now_ms.saturating_sub(rules.recency_window_ms);
    let mut processed = existing.clone();
    let mut notify = Vec::new();

    for entry in entries {
        if entry.link == rules.status_page_url {
            log::debug!("Skipping status page root entry '{}'", entry.title);
            continue;
        }
        if !rules.is_relevant(&entry.title) {
            log::debug!("Skipping unrelated entry '{}'", entry.title);
            continue;
        }

        let key = entry.key();
        // `processed` already holds `existing`, so a key repeated within one
        // feed is announced once.
        if !rules.test_mode && !processed.insert(key.clone()) {
            log::debug!("Already processed {}", key);
            continue;
        }

        if entry.published < cutoff {
            log::info!("Recorded {} without announcing (too old)", key);
            continue;
        }

        notify.push(entry);
    }

    FilterOutcome { processed, notify }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;
    const MINUTE: i64 = 60_000;

    fn rules() -> FilterRules {
        FilterRules {
            status_page_url: "https://status.acme.example".to_string(),
            service_name: "Acme".to_string(),
            platform_name: "Widget".to_string(),
            recency_window_ms: 60 * MINUTE,
            test_mode: false,
        }
    }

    fn entry(title: &str, link: &str, published: i64) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: link.to_string(),
            published,
            ..FeedEntry::default()
        }
    }

    fn incident(id: u32, minutes_ago: i64) -> FeedEntry {
        entry(
            "Acme Maintenance",
            &format!("https://status.acme.example/incidents/{id}"),
            NOW - minutes_ago * MINUTE,
        )
    }

    #[test]
    fn test_root_link_is_ignored() {
        let entries = vec![entry("Acme Status", "https://status.acme.example", NOW)];
        let outcome = filter_entries(entries, &ProcessedSet::new(), &rules(), NOW);

        assert!(outcome.notify.is_empty());
        assert!(outcome.processed.is_empty());
    }

    #[test]
    fn test_root_link_match_is_exact() {
        let entries = vec![entry("Acme Status", "https://status.acme.example/", NOW)];
        let outcome = filter_entries(entries, &ProcessedSet::new(), &rules(), NOW);

        assert_eq!(outcome.notify.len(), 1);
        assert!(outcome.processed.contains(&format!("-{NOW}")));
    }

    #[test]
    fn test_comma_in_link_survives_reload() {
        let first = filter_entries(
            vec![entry("Acme notice", "https://status.acme.example/incidents/a,b", NOW - MINUTE)],
            &ProcessedSet::new(),
            &rules(),
            NOW,
        );
        assert_eq!(first.notify.len(), 1);

        let reloaded = ProcessedSet::parse(first.processed.encode().as_deref());
        assert_eq!(reloaded, first.processed);

        let second = filter_entries(
            vec![entry("Acme notice", "https://status.acme.example/incidents/a,b", NOW - MINUTE)],
            &reloaded,
            &rules(),
            NOW,
        );
        assert!(second.notify.is_empty());
        assert_eq!(second.processed.encode(), first.processed.encode());
    }

    #[test]
    fn test_unrelated_title_is_ignored() {
        let entries = vec![
            entry("Other outage", "https://status.acme.example/incidents/1", NOW),
            entry("acme lowercase", "https://status.acme.example/incidents/2", NOW),
        ];
        let outcome = filter_entries(entries, &ProcessedSet::new(), &rules(), NOW);

        assert!(outcome.notify.is_empty());
        assert!(outcome.processed.is_empty());
    }

    #[test]
    fn test_rules_normalize_status_page_url() {
        let mut config = Config::default();
        config.relay.status_page_url = "https://status.acme.example".to_string();
        let rules = FilterRules::from_config(&config);
        assert_eq!(rules.status_page_url, "https://status.acme.example/");

        let entries = vec![entry("Acme Status", "https://status.acme.example/", NOW)];
        let outcome = filter_entries(entries, &ProcessedSet::new(), &rules, NOW);
        assert!(outcome.processed.is_empty());
    }

    #[test]
    fn test_empty_name_matches_nothing() {
        let mut rules = rules();
        rules.platform_name.clear();

        let entries = vec![entry("Other outage", "https://status.acme.example/incidents/1", NOW)];
        let outcome = filter_entries(entries, &ProcessedSet::new(), &rules, NOW);
        assert!(outcome.notify.is_empty());
        assert!(outcome.processed.is_empty());
    }

    #[test]
    fn test_platform_name_matches() {
        let entries = vec![entry(
            "Widget API degraded",
            "https://status.acme.example/incidents/9",
            NOW,
        )];
        let outcome = filter_entries(entries, &ProcessedSet::new(), &rules(), NOW);
        assert_eq!(outcome.notify.len(), 1);
    }

    #[test]
    fn test_new_recent_entry_is_announced_and_recorded() {
        let e = incident(42, 10);
        let expected_key = format!("42-{}", e.published);
        let outcome = filter_entries(vec![e], &ProcessedSet::new(), &rules(), NOW);

        assert_eq!(outcome.notify.len(), 1);
        assert_eq!(outcome.processed.iter().collect::<Vec<_>>(), vec![expected_key]);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let first = filter_entries(vec![incident(42, 10)], &ProcessedSet::new(), &rules(), NOW);
        let second = filter_entries(
            vec![incident(42, 10)],
            &first.processed,
            &rules(),
            NOW + MINUTE,
        );

        assert!(second.notify.is_empty());
        assert_eq!(second.processed, first.processed);
        assert_eq!(second.processed.len(), 1);
    }

    #[test]
    fn test_old_entry_is_recorded_not_announced() {
        let outcome = filter_entries(vec![incident(7, 120)], &ProcessedSet::new(), &rules(), NOW);

        assert!(outcome.notify.is_empty());
        assert_eq!(outcome.processed.len(), 1);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let outcome = filter_entries(vec![incident(8, 60)], &ProcessedSet::new(), &rules(), NOW);
        assert_eq!(outcome.notify.len(), 1);

        let mut just_outside = incident(9, 60);
        just_outside.published -= 1;
        let outcome = filter_entries(vec![just_outside], &ProcessedSet::new(), &rules(), NOW);
        assert!(outcome.notify.is_empty());
    }

    #[test]
    fn test_existing_keys_are_kept_in_order() {
        let existing = ProcessedSet::parse(Some("old-1,old-2"));
        let outcome = filter_entries(vec![incident(3, 5)], &existing, &rules(), NOW);

        let keys: Vec<_> = outcome.processed.iter().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(&keys[..2], &["old-1", "old-2"]);
    }

    #[test]
    fn test_feed_order_is_preserved() {
        let entries = vec![incident(3, 5), incident(1, 1), incident(2, 30)];
        let outcome = filter_entries(entries, &ProcessedSet::new(), &rules(), NOW);

        let ids: Vec<_> = outcome.notify.iter().map(|e| e.link.clone()).collect();
        assert!(ids[0].ends_with("/3"));
        assert!(ids[1].ends_with("/1"));
        assert!(ids[2].ends_with("/2"));
    }

    #[test]
    fn test_test_mode_bypasses_dedup() {
        let mut rules = rules();
        rules.test_mode = true;

        let e = incident(42, 10);
        let existing = ProcessedSet::parse(Some(e.key().as_str()));
        let outcome = filter_entries(vec![e], &existing, &rules, NOW);

        assert_eq!(outcome.notify.len(), 1);
        assert_eq!(outcome.processed, existing);
    }

    #[test]
    fn test_repeated_entry_in_one_feed_announced_once() {
        let outcome = filter_entries(
            vec![incident(5, 1), incident(5, 1)],
            &ProcessedSet::new(),
            &rules(),
            NOW,
        );
        assert_eq!(outcome.notify.len(), 1);
        assert_eq!(outcome.processed.len(), 1);
    }

    #[test]
    fn test_degenerate_link_accepted() {
        let e = entry("Acme notice", "https://status.acme.example/incidents/", NOW);
        let outcome = filter_entries(vec![e], &ProcessedSet::new(), &rules(), NOW);

        assert_eq!(outcome.notify.len(), 1);
        assert!(outcome.processed.contains(&format!("-{NOW}")));
    }
}
