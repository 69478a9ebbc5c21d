//! Service layer for the relay.
//!
//! This module wraps the three external collaborators:
//! - Availability probing (`AvailabilityProbe`)
//! - Feed fetching (`FeedFetcher`) and detail scraping (`DetailScraper`)
//! - Social posting (`SocialClient`)

mod detail;
mod feed;
mod probe;
mod social;

pub use detail::{DetailScraper, EntryDetail, strip_doctype};
pub use feed::{FeedFetcher, parse_feed};
pub use probe::{AvailabilityProbe, ProbeResult};
pub use social::SocialClient;
