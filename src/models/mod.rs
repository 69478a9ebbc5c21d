// src/models/mod.rs

//! Domain models for the relay.

mod config;
mod entry;
mod message;

// Re-export all public types
pub use config::{
    CategoryMarker, Config, DetailConfig, HttpConfig, MessageConfig, RelayConfig, ServerConfig,
    SocialConfig, StorageBackend, StorageConfig,
};
pub use entry::{EntryKey, FeedEntry};
pub use message::{Category, DeliveryReport, DeliveryStatus, OutboundMessage, RunReport};
