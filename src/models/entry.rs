//! Feed entry data structure.

use serde::{Deserialize, Serialize};

use crate::utils::last_path_segment;

/// Dedup identity of an entry, `{id}-{published ms}`.
pub type EntryKey = String;

/// One item from the polled status feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FeedEntry {
    /// Entry title
    pub title: String,

    /// Plain-text description (HTML stripped)
    pub description: String,

    /// Full URL to the incident or maintenance page
    pub link: String,

    /// Publication time in epoch milliseconds
    pub published: i64,

    /// Author name, carried through uninterpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Category terms, carried through uninterpreted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    /// Enclosure and media URLs, carried through uninterpreted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enclosures: Vec<String>,
}

impl FeedEntry {
    /// Dedup identity: `{last path segment of link}-{published}`.
    ///
    /// Commas in the segment are percent-encoded so the key never contains
    /// the processed-set separator.
    pub fn key(&self) -> EntryKey {
        let id = last_path_segment(&self.link).replace(',', "%2C");
        format!("{}-{}", id, self.published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(link: &str, published: i64) -> FeedEntry {
        FeedEntry {
            title: "Acme Maintenance".to_string(),
            link: link.to_string(),
            published,
            ..FeedEntry::default()
        }
    }

    #[test]
    fn test_key_uses_last_segment() {
        let e = entry("https://status.acme.example/incidents/42", 1_700_000_000_000);
        assert_eq!(e.key(), "42-1700000000000");
    }

    #[test]
    fn test_key_ignores_query() {
        let e = entry("https://status.acme.example/incidents/abc?utm=rss", 5);
        assert_eq!(e.key(), "abc-5");
    }

    #[test]
    fn test_key_escapes_comma() {
        let e = entry("https://status.acme.example/incidents/a,b", 9);
        assert_eq!(e.key(), "a%2Cb-9");
    }

    #[test]
    fn test_key_degenerate_root_link() {
        let e = entry("https://status.acme.example", 7);
        assert_eq!(e.key(), "-7");
    }
}
