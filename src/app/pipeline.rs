//! Shared "aggregate" pipeline used by every CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! date window -> query specs -> concurrent fetch (join-all) -> merge
//!
//! The commands can then focus on presentation (report, chart, watch loop).

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::data::{Endpoints, JsonSource};
use crate::domain::{DateWindow, MergedRecord, QuerySpec, RawResponseSet};
use crate::error::FetchError;
use crate::merge::merge_record;

/// Fetches and merges every dataset for one subject.
pub struct Aggregator<S> {
    source: S,
    endpoints: Endpoints,
    timeout: Duration,
}

impl<S: JsonSource> Aggregator<S> {
    pub fn new(source: S, endpoints: Endpoints, timeout: Duration) -> Self {
        Self {
            source,
            endpoints,
            timeout,
        }
    }

    /// Aggregate against today's (UTC) date window.
    pub async fn aggregate(&self, subject: &str) -> Result<MergedRecord, FetchError> {
        self.aggregate_at(subject, Utc::now().date_naive()).await
    }

    /// Aggregate against the window ending at `today`.
    ///
    /// All targets run concurrently. The first failing target aborts the others and
    /// fails the whole aggregation; no partial record is ever produced.
    pub async fn aggregate_at(&self, subject: &str, today: NaiveDate) -> Result<MergedRecord, FetchError> {
        let window = DateWindow::trailing(today);
        let specs = self.endpoints.query_specs(subject, &window);
        info!(subject, from = %window.from, to = %window.to, targets = specs.len(), "aggregating");

        let raw = tokio::time::timeout(self.timeout, self.fetch_all(&specs))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout.as_secs()))?
            .inspect_err(|e| warn!(subject, "fetch failed: {e}"))?;

        let record = merge_record(subject, &raw).inspect_err(|e| warn!(subject, "merge failed: {e}"))?;
        info!(
            subject,
            page_id = record.page_id,
            total_views = record.total_views,
            "aggregated"
        );
        Ok(record)
    }

    async fn fetch_all(&self, specs: &[QuerySpec]) -> Result<RawResponseSet, FetchError> {
        let fetches = specs.iter().map(|spec| async move {
            let value = self.source.fetch_json(spec).await?;
            debug!(key = %spec.key, "fetched");
            Ok::<_, FetchError>((spec.key, value))
        });
        let payloads = try_join_all(fetches).await?;
        Ok(payloads.into_iter().collect())
    }
}
