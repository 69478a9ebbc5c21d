//! Pipeline entry points for relay operations.
//!
//! - `filter_entries`: Decide which entries to announce and grow the processed set
//! - `compose_detailed` / `compose_summary`: Render post text
//! - `Relay::run`: One full tick against the live services

pub mod compose;
pub mod filter;
pub mod relay;

pub use compose::{compose_detailed, compose_summary};
pub use filter::{FilterOutcome, FilterRules, filter_entries};
pub use relay::{Relay, run_relay};
