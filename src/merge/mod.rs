//! Reconciliation of heterogeneous API payloads into one `MergedRecord`.
//!
//! - page selection, revision fallback, field defaults (`record`)
//! - view totals and editor statistics (`metrics`)

pub mod metrics;
pub mod record;

pub use metrics::*;
pub use record::*;
