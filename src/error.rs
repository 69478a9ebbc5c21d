// src/error.rs

//! Unified error handling for the relay.

use std::fmt;

use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Key-value backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Feed could not be fetched or parsed
    #[error("Feed error for {url}: {message}")]
    Feed { url: String, message: String },

    /// Social API rejected or failed a post
    #[error("Delivery error: {0}")]
    Delivery(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Create a feed error with the offending URL.
    pub fn feed(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Feed {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error.
    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::Delivery(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_error_mentions_url() {
        let err = AppError::feed("https://status.example.com/history.rss", "bad xml");
        assert_eq!(
            err.to_string(),
            "Feed error for https://status.example.com/history.rss: bad xml"
        );
    }

    #[test]
    fn test_selector_error_format() {
        let err = AppError::selector("[[", "unexpected token");
        assert_eq!(err.to_string(), "Invalid selector '[[': unexpected token");
    }
}
