// src/services/detail.rs

//! Detail page scraper.
//!
//! Each incident or maintenance page is fetched and inspected for a severity
//! marker (decides the category) and a prose block (the description).

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Category, DetailConfig};
use crate::utils::{http, normalize_whitespace};

/// Leading DOCTYPE declaration, including malformed variants the HTML parser
/// trips over.
static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\A[\s\x{feff}]*<!doctype[^>]*>").expect("static doctype pattern")
});

/// Information scraped from a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDetail {
    pub category: Category,
    pub description: String,
}

/// Scraper for status detail pages.
pub struct DetailScraper {
    client: Client,
    markers: Vec<(Selector, Category)>,
    prose: Selector,
    fallback_description: String,
}

impl DetailScraper {
    /// Build a scraper, compiling all configured selectors up front.
    pub fn new(client: Client, config: &DetailConfig) -> Result<Self> {
        let markers = config
            .markers
            .iter()
            .map(|m| -> Result<(Selector, Category)> {
                Ok((Self::parse_selector(&m.selector)?, m.category))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            client,
            markers,
            prose: Self::parse_selector(&config.prose_selector)?,
            fallback_description: config.fallback_description.clone(),
        })
    }

    /// Fetch and scrape the page at `url`.
    pub async fn fetch(&self, url: &str) -> Result<EntryDetail> {
        let html = http::fetch_text(&self.client, url).await?;
        Ok(self.parse(&html))
    }

    /// Scrape an already fetched page.
    pub fn parse(&self, html: &str) -> EntryDetail {
        let document = Html::parse_document(strip_doctype(html));

        EntryDetail {
            category: self.category(&document),
            description: self.description(&document),
        }
    }

    /// Category of the first element, in document order, matching any marker.
    fn category(&self, document: &Html) -> Category {
        document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find_map(|element| {
                self.markers
                    .iter()
                    .find(|(selector, _)| selector.matches(&element))
                    .map(|(_, category)| *category)
            })
            .unwrap_or(Category::Notice)
    }

    fn description(&self, document: &Html) -> String {
        document
            .select(&self.prose)
            .next()
            .map(|element| normalize_whitespace(&element.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| self.fallback_description.clone())
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Remove a leading DOCTYPE declaration.
pub fn strip_doctype(html: &str) -> &str {
    match DOCTYPE.find(html) {
        Some(m) => &html[m.end()..],
        None => html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryMarker;

    fn scraper() -> DetailScraper {
        DetailScraper::new(Client::new(), &DetailConfig::default()).unwrap()
    }

    #[test]
    fn test_strip_doctype_variants() {
        assert_eq!(strip_doctype("<!DOCTYPE html><p>x</p>"), "<p>x</p>");
        assert_eq!(strip_doctype("\n  <!doctype html5 ><p>x</p>"), "<p>x</p>");
        assert_eq!(
            strip_doctype("\u{feff}<!DOCTYPE html PUBLIC \"broken><p>x</p>"),
            "<p>x</p>"
        );
        assert_eq!(strip_doctype("<p>no doctype</p>"), "<p>no doctype</p>");
    }

    #[test]
    fn test_maintenance_marker() {
        let detail = scraper().parse(
            r#"<!DOCTYPE html><html><body>
                <div class="status-maintenance">Maintenance</div>
                <div class="prose"><p>Database   upgrade
                   in progress.</p></div>
            </body></html>"#,
        );
        assert_eq!(detail.category, Category::Maintenance);
        assert_eq!(detail.description, "Database upgrade in progress.");
    }

    #[test]
    fn test_first_marker_in_document_order_wins() {
        let detail = scraper().parse(
            r#"<html><body>
                <span class="status-downtime">Down</span>
                <span class="status-maintenance">Maintenance</span>
            </body></html>"#,
        );
        assert_eq!(detail.category, Category::Incident);
    }

    #[test]
    fn test_degraded_is_incident() {
        let detail = scraper().parse(r#"<div class="status-degraded"></div>"#);
        assert_eq!(detail.category, Category::Incident);
    }

    #[test]
    fn test_no_marker_is_notice_with_fallback() {
        let detail = scraper().parse("<html><body><p>Hello</p></body></html>");
        assert_eq!(detail.category, Category::Notice);
        assert_eq!(detail.description, "No details available.");
    }

    #[test]
    fn test_empty_prose_uses_fallback() {
        let detail = scraper().parse(r#"<div class="prose">   </div>"#);
        assert_eq!(detail.description, "No details available.");
    }

    #[test]
    fn test_custom_markers() {
        let config = DetailConfig {
            markers: vec![CategoryMarker {
                selector: "h1.impact-maintenance".to_string(),
                category: Category::Maintenance,
            }],
            ..DetailConfig::default()
        };
        let scraper = DetailScraper::new(Client::new(), &config).unwrap();
        let detail = scraper.parse(r#"<h1 class="impact-maintenance">Planned</h1>"#);
        assert_eq!(detail.category, Category::Maintenance);
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = DetailConfig {
            prose_selector: "[[".to_string(),
            ..DetailConfig::default()
        };
        assert!(DetailScraper::new(Client::new(), &config).is_err());
    }
}
