//! Loosely-typed response shapes for the five upstream APIs.
//!
//! Every field is optional: absent fields are expected, and the merge step picks
//! the fallback. Only a payload whose *structure* is wrong (e.g. an array where an
//! object is expected) fails to decode.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::QueryKey;
use crate::error::FetchError;

/// `action=query` envelope shared by the metadata, revisions and backlinks targets.
#[derive(Debug, Default, Deserialize)]
pub struct QueryEnvelope {
    pub query: Option<QueryBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryBody {
    /// Keyed by page id as a string (`"-1"` for missing pages).
    pub pages: Option<BTreeMap<String, PageEntry>>,
    pub backlinks: Option<Vec<TitleRef>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageEntry {
    pub pageid: Option<u64>,
    pub title: Option<String>,
    /// Present (usually as `""`) when the title does not exist.
    pub missing: Option<serde_json::Value>,
    /// Present when the title is syntactically invalid.
    pub invalid: Option<serde_json::Value>,
    pub length: Option<u64>,
    pub touched: Option<String>,
    pub fullurl: Option<String>,
    pub protection: Option<Vec<Protection>>,
    pub langlinks: Option<Vec<serde_json::Value>>,
    pub links: Option<Vec<TitleRef>>,
    pub revisions: Option<Vec<Revision>>,
}

impl PageEntry {
    /// True when upstream flagged the page as missing or invalid.
    pub fn is_missing(&self) -> bool {
        flag_set(self.missing.as_ref()) || flag_set(self.invalid.as_ref())
    }
}

// formatversion=1 uses `""`, formatversion=2 uses `true`.
fn flag_set(flag: Option<&serde_json::Value>) -> bool {
    !matches!(flag, None | Some(serde_json::Value::Bool(false)))
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Protection {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TitleRef {
    pub title: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Revision {
    pub revid: Option<u64>,
    pub user: Option<String>,
    pub timestamp: Option<String>,
}

/// REST `page/summary` response.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryPayload {
    pub extract: Option<String>,
    pub thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnail {
    pub source: Option<String>,
}

/// REST `metrics/pageviews/per-article` response.
#[derive(Debug, Default, Deserialize)]
pub struct PageviewsPayload {
    pub items: Option<Vec<PageviewItem>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageviewItem {
    pub timestamp: Option<String>,
    pub views: Option<u64>,
}

/// Destructure an untyped payload into one of the shapes above.
pub fn decode<T: DeserializeOwned>(key: QueryKey, value: &serde_json::Value) -> Result<T, FetchError> {
    T::deserialize(value).map_err(|e| FetchError::Malformed(format!("{key} payload: {e}")))
}
