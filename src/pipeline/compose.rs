// src/pipeline/compose.rs

//! Message composition.
//!
//! ```text
//! 【<category label>】
//! <title>
//! <description>
//! <link>
//! ```

use crate::models::{FeedEntry, MessageConfig, OutboundMessage};
use crate::services::EntryDetail;
use crate::utils::truncate_graphemes;

/// Compose a message from a scraped detail page.
pub fn compose_detailed(
    entry: &FeedEntry,
    detail: &EntryDetail,
    messages: &MessageConfig,
) -> OutboundMessage {
    render(
        entry,
        messages.label(detail.category),
        &detail.description,
        messages,
    )
}

/// Compose a message from feed data only, under the fixed summary header.
///
/// A description equal to the completion sentinel is replaced with the
/// completion text.
pub fn compose_summary(entry: &FeedEntry, messages: &MessageConfig) -> OutboundMessage {
    let description = if entry.description.trim() == messages.completed_sentinel {
        messages.completed_text.as_str()
    } else {
        entry.description.as_str()
    };
    render(entry, &messages.summary_label, description, messages)
}

fn render(
    entry: &FeedEntry,
    label: &str,
    description: &str,
    messages: &MessageConfig,
) -> OutboundMessage {
    let description = truncate_graphemes(description, messages.max_description_chars);
    OutboundMessage {
        key: entry.key(),
        link: entry.link.clone(),
        text: format!("【{}】\n{}\n{}\n{}", label, entry.title, description, entry.link),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn sample_entry(description: &str) -> FeedEntry {
        FeedEntry {
            title: "Acme Maintenance".to_string(),
            description: description.to_string(),
            link: "https://status.acme.example/incidents/42".to_string(),
            published: 1_700_000_000_000,
            ..FeedEntry::default()
        }
    }

    #[test]
    fn test_detailed_format() {
        let detail = EntryDetail {
            category: Category::Maintenance,
            description: "Database upgrade.".to_string(),
        };
        let message = compose_detailed(&sample_entry(""), &detail, &MessageConfig::default());

        assert_eq!(
            message.text,
            "【Maintenance Notice】\nAcme Maintenance\nDatabase upgrade.\nhttps://status.acme.example/incidents/42"
        );
        assert_eq!(message.key, "42-1700000000000");
    }

    #[test]
    fn test_detailed_labels() {
        let messages = MessageConfig::default();
        for (category, label) in [
            (Category::Notice, "【Notice】"),
            (Category::Incident, "【Incident】"),
            (Category::Maintenance, "【Maintenance Notice】"),
        ] {
            let detail = EntryDetail {
                category,
                description: "x".to_string(),
            };
            let message = compose_detailed(&sample_entry(""), &detail, &messages);
            assert!(message.text.starts_with(label), "{}", message.text);
        }
    }

    #[test]
    fn test_summary_replaces_sentinel() {
        let message = compose_summary(&sample_entry("Completed"), &MessageConfig::default());
        assert_eq!(
            message.text,
            "【Maintenance / Incident Info】\nAcme Maintenance\nMaintenance has been completed.\nhttps://status.acme.example/incidents/42"
        );
    }

    #[test]
    fn test_summary_passes_description_through() {
        let message = compose_summary(
            &sample_entry("Investigating elevated errors"),
            &MessageConfig::default(),
        );
        assert!(message.text.contains("\nInvestigating elevated errors\n"));
    }

    #[test]
    fn test_long_description_is_truncated() {
        let messages = MessageConfig {
            max_description_chars: 5,
            ..MessageConfig::default()
        };
        let message = compose_summary(&sample_entry("abcdefghij"), &messages);
        assert!(message.text.contains("\nabcde…\n"));
    }
}
