//! Remote data sources: query targets, the HTTP client, and payload shapes.

pub mod payload;
pub mod wiki;

pub use wiki::{ClientConfig, Endpoints, JsonSource, WikiClient};
