//! Application configuration structures.
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables, so a deployment can run from the environment alone.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Category;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Watched service, status page and filter settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// Social API credentials and post settings
    #[serde(default)]
    pub social: SocialConfig,

    /// Dedup store backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Liveness server and scheduler
    #[serde(default)]
    pub server: ServerConfig,

    /// Detail page scraping markers
    #[serde(default)]
    pub detail: DetailConfig,

    /// Message template strings
    #[serde(default)]
    pub message: MessageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override fields from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Override fields from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, name: &str| {
            if let Some(value) = lookup(name) {
                *target = value;
            }
        };

        set(&mut self.relay.service_url, "RELAY_SERVICE_URL");
        set(&mut self.relay.status_page_url, "RELAY_STATUS_PAGE_URL");
        set(&mut self.relay.service_name, "RELAY_SERVICE_NAME");
        set(&mut self.relay.platform_name, "RELAY_PLATFORM_NAME");
        set(&mut self.social.token, "RELAY_API_TOKEN");
        set(&mut self.storage.key, "RELAY_STORAGE_KEY");
        set(&mut self.storage.dir, "RELAY_STORAGE_DIR");
        set(&mut self.storage.bucket, "S3_BUCKET");
        set(&mut self.storage.prefix, "S3_PREFIX");
        set(&mut self.server.listen, "RELAY_LISTEN");

        if let Some(value) = lookup("RELAY_FEED_URL") {
            self.relay.feed_url = Some(value);
        }
        if let Some(value) = lookup("RELAY_API_URL") {
            self.social.api_url = Some(value);
        }
        if let Some(value) = lookup("RELAY_TEST_MODE") {
            self.relay.test_mode = parse_flag("RELAY_TEST_MODE", &value)?;
        }
        if let Some(value) = lookup("RELAY_MANUAL_TRIGGER") {
            self.server.manual_trigger = parse_flag("RELAY_MANUAL_TRIGGER", &value)?;
        }
        if let Some(value) = lookup("RELAY_INTERVAL_SECS") {
            self.server.interval_secs = value.trim().parse().map_err(|_| {
                AppError::config(format!("RELAY_INTERVAL_SECS is not a number: {value}"))
            })?;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("relay.service_url", &self.relay.service_url),
            ("relay.status_page_url", &self.relay.status_page_url),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
            url::Url::parse(value)?;
        }
        url::Url::parse(&self.feed_url())?;
        url::Url::parse(self.api_url())?;

        if self.relay.service_name.is_empty() && self.relay.platform_name.is_empty() {
            return Err(AppError::validation(
                "relay.service_name and relay.platform_name are both empty",
            ));
        }
        if self.social.token.trim().is_empty() && !self.relay.test_mode {
            return Err(AppError::validation(
                "social.token is empty (set RELAY_API_TOKEN or enable test mode)",
            ));
        }
        if self.storage.key.trim().is_empty() {
            return Err(AppError::validation("storage.key is empty"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if window_ms(self.relay.recency_window_secs).is_none() {
            return Err(AppError::validation(
                "relay.recency_window_secs is too large",
            ));
        }
        if self.server.interval_secs == 0 {
            return Err(AppError::validation("server.interval_secs must be > 0"));
        }
        if !self.server.trigger_path.starts_with('/') || self.server.trigger_path == "/" {
            return Err(AppError::validation(
                "server.trigger_path must start with '/' and not be the root",
            ));
        }
        for marker in &self.detail.markers {
            scraper::Selector::parse(&marker.selector)
                .map_err(|e| AppError::selector(&marker.selector, format!("{e:?}")))?;
        }
        scraper::Selector::parse(&self.detail.prose_selector)
            .map_err(|e| AppError::selector(&self.detail.prose_selector, format!("{e:?}")))?;
        Ok(())
    }

    /// RSS feed URL, derived from the status page when not set explicitly.
    pub fn feed_url(&self) -> String {
        match &self.relay.feed_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!(
                "{}/history.rss",
                self.relay.status_page_url.trim_end_matches('/')
            ),
        }
    }

    /// Social API base URL, defaulting to the watched service itself.
    pub fn api_url(&self) -> &str {
        match &self.social.api_url {
            Some(url) if !url.trim().is_empty() => url,
            _ => &self.relay.service_url,
        }
    }

    /// Recency window in milliseconds. Out-of-range values clamp to `i64::MAX`.
    pub fn recency_window_ms(&self) -> i64 {
        window_ms(self.relay.recency_window_secs).unwrap_or(i64::MAX)
    }
}

fn window_ms(secs: u64) -> Option<i64> {
    i64::try_from(secs).ok()?.checked_mul(1000)
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::config(format!(
            "{name} must be a boolean, got '{other}'"
        ))),
    }
}

/// Watched service and filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL of the service whose status is relayed
    #[serde(default)]
    pub service_url: String,

    /// Root URL of the status page
    #[serde(default)]
    pub status_page_url: String,

    /// Explicit feed URL (defaults to `{status_page_url}/history.rss`)
    #[serde(default)]
    pub feed_url: Option<String>,

    /// Service display name matched against entry titles
    #[serde(default)]
    pub service_name: String,

    /// Platform display name matched against entry titles
    #[serde(default)]
    pub platform_name: String,

    /// Entries older than this are recorded but not announced
    #[serde(default = "defaults::recency_window_secs")]
    pub recency_window_secs: u64,

    /// Disable dedup and posting for manual verification
    #[serde(default)]
    pub test_mode: bool,

    /// Scrape each entry's detail page for category and description
    #[serde(default = "defaults::enabled")]
    pub enrich: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            service_url: String::new(),
            status_page_url: String::new(),
            feed_url: None,
            service_name: String::new(),
            platform_name: String::new(),
            recency_window_secs: defaults::recency_window_secs(),
            test_mode: false,
            enrich: defaults::enabled(),
        }
    }
}

/// Social API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// API base URL (defaults to `relay.service_url`)
    #[serde(default)]
    pub api_url: Option<String>,

    /// Access token sent with every post
    #[serde(default)]
    pub token: String,

    /// Post visibility
    #[serde(default = "defaults::visibility")]
    pub visibility: String,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            token: String::new(),
            visibility: defaults::visibility(),
        }
    }
}

/// Which key-value backend holds the dedup store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under `storage.dir`
    #[default]
    Local,
    /// Process memory, lost on exit
    Memory,
    /// Objects under `s3://{bucket}/{prefix}/`
    S3,
}

/// Dedup store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Well-known key holding the processed entry list
    #[serde(default = "defaults::storage_key")]
    pub key: String,

    /// Root directory for the local backend
    #[serde(default = "defaults::storage_dir")]
    pub dir: String,

    /// Bucket for the S3 backend
    #[serde(default = "defaults::bucket")]
    pub bucket: String,

    /// Key prefix for the S3 backend
    #[serde(default = "defaults::prefix")]
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            key: defaults::storage_key(),
            dir: defaults::storage_dir(),
            bucket: defaults::bucket(),
            prefix: defaults::prefix(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Liveness server and scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address for the HTTP server
    #[serde(default = "defaults::listen")]
    pub listen: String,

    /// Expose the manual trigger endpoint
    #[serde(default)]
    pub manual_trigger: bool,

    /// Path of the manual trigger endpoint
    #[serde(default = "defaults::trigger_path")]
    pub trigger_path: String,

    /// Seconds between scheduled ticks
    #[serde(default = "defaults::interval_secs")]
    pub interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: defaults::listen(),
            manual_trigger: false,
            trigger_path: defaults::trigger_path(),
            interval_secs: defaults::interval_secs(),
        }
    }
}

/// Maps a CSS selector on a detail page to a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryMarker {
    pub selector: String,
    pub category: Category,
}

/// Detail page scraping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailConfig {
    /// Severity markers, first match in document order wins
    #[serde(default = "defaults::markers")]
    pub markers: Vec<CategoryMarker>,

    /// Selector for the element holding the incident prose
    #[serde(default = "defaults::prose_selector")]
    pub prose_selector: String,

    /// Used when no prose element is found
    #[serde(default = "defaults::fallback_description")]
    pub fallback_description: String,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            markers: defaults::markers(),
            prose_selector: defaults::prose_selector(),
            fallback_description: defaults::fallback_description(),
        }
    }
}

/// Message template strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    #[serde(default = "defaults::notice_label")]
    pub notice_label: String,

    #[serde(default = "defaults::incident_label")]
    pub incident_label: String,

    #[serde(default = "defaults::maintenance_label")]
    pub maintenance_label: String,

    /// Fixed header used when enrichment is disabled
    #[serde(default = "defaults::summary_label")]
    pub summary_label: String,

    /// Feed description that marks a finished maintenance
    #[serde(default = "defaults::completed_sentinel")]
    pub completed_sentinel: String,

    /// Replacement text for the sentinel description
    #[serde(default = "defaults::completed_text")]
    pub completed_text: String,

    /// Descriptions longer than this many graphemes are cut
    #[serde(default = "defaults::max_description_chars")]
    pub max_description_chars: usize,
}

impl MessageConfig {
    /// Display label for a category.
    pub fn label(&self, category: Category) -> &str {
        match category {
            Category::Notice => &self.notice_label,
            Category::Incident => &self.incident_label,
            Category::Maintenance => &self.maintenance_label,
        }
    }
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            notice_label: defaults::notice_label(),
            incident_label: defaults::incident_label(),
            maintenance_label: defaults::maintenance_label(),
            summary_label: defaults::summary_label(),
            completed_sentinel: defaults::completed_sentinel(),
            completed_text: defaults::completed_text(),
            max_description_chars: defaults::max_description_chars(),
        }
    }
}

mod defaults {
    use super::CategoryMarker;
    use crate::models::Category;

    pub fn enabled() -> bool {
        true
    }

    // Relay defaults
    pub fn recency_window_secs() -> u64 {
        3600
    }
    pub fn visibility() -> String {
        "home".into()
    }

    // Storage defaults
    pub fn storage_key() -> String {
        "processed_entries".into()
    }
    pub fn storage_dir() -> String {
        "storage".into()
    }
    pub fn bucket() -> String {
        "status-relay".into()
    }
    pub fn prefix() -> String {
        "status-relay".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; status-relay/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Server defaults
    pub fn listen() -> String {
        "0.0.0.0:8080".into()
    }
    pub fn trigger_path() -> String {
        "/trigger".into()
    }
    pub fn interval_secs() -> u64 {
        300
    }

    // Detail defaults
    pub fn markers() -> Vec<CategoryMarker> {
        vec![
            CategoryMarker {
                selector: ".status-maintenance".into(),
                category: Category::Maintenance,
            },
            CategoryMarker {
                selector: ".status-degraded".into(),
                category: Category::Incident,
            },
            CategoryMarker {
                selector: ".status-downtime".into(),
                category: Category::Incident,
            },
        ]
    }
    pub fn prose_selector() -> String {
        ".prose".into()
    }
    pub fn fallback_description() -> String {
        "No details available.".into()
    }

    // Message defaults
    pub fn notice_label() -> String {
        "Notice".into()
    }
    pub fn incident_label() -> String {
        "Incident".into()
    }
    pub fn maintenance_label() -> String {
        "Maintenance Notice".into()
    }
    pub fn summary_label() -> String {
        "Maintenance / Incident Info".into()
    }
    pub fn completed_sentinel() -> String {
        "Completed".into()
    }
    pub fn completed_text() -> String {
        "Maintenance has been completed.".into()
    }
    pub fn max_description_chars() -> usize {
        1000
    }
}
