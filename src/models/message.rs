//! Outbound message and run report structures.

use serde::{Deserialize, Serialize};

/// Classification scraped from an entry's detail page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// No severity marker found
    #[default]
    Notice,
    /// Degraded performance or downtime
    Incident,
    /// Scheduled maintenance
    Maintenance,
}

/// A composed notification, consumed immediately by delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Dedup key of the source entry
    pub key: String,
    /// Link of the source entry
    pub link: String,
    /// Post body
    pub text: String,
}

/// What happened to a single message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Accepted by the social API
    Posted { note_id: Option<String> },
    /// Composed but not sent (test mode)
    DryRun,
    /// Enrichment or posting failed
    Failed { error: String },
}

/// Per-entry outcome of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryReport {
    pub key: String,
    pub link: String,
    pub text: String,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl DeliveryReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, DeliveryStatus::Failed { .. })
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunReport {
    /// An upstream host was unreachable; nothing was read or written
    Skipped { reason: String },
    /// The pipeline ran to the end
    Completed {
        deliveries: Vec<DeliveryReport>,
        seen_total: usize,
    },
}

impl RunReport {
    /// Delivery reports, empty for a skipped run.
    pub fn deliveries(&self) -> &[DeliveryReport] {
        match self {
            RunReport::Skipped { .. } => &[],
            RunReport::Completed { deliveries, .. } => deliveries,
        }
    }

    /// Consume the report and return its delivery list.
    pub fn into_deliveries(self) -> Vec<DeliveryReport> {
        match self {
            RunReport::Skipped { .. } => Vec::new(),
            RunReport::Completed { deliveries, .. } => deliveries,
        }
    }
}
