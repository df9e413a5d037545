//! Reporting utilities: formatted terminal output for aggregated records.

pub mod format;

pub use format::{format_record, format_record_in};
