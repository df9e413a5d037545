//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built once per submission (`QuerySpec`, `DateWindow`)
//! - exported to JSON (`MergedRecord`)
//! - handed to the chart renderer (`SeriesPoint`)

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Fallback text for scalar fields that the upstream APIs did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Fallback text for an unprotected page.
pub const NO_PROTECTION: &str = "None";

/// Length of the trailing page-view window, in days.
pub const WINDOW_DAYS: u64 = 30;

/// Purpose tag of one remote read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKey {
    /// Page properties, thumbnail, outbound links, interlanguage links, protection.
    Metadata,
    /// Revision history, oldest first.
    Revisions,
    /// Inbound links.
    Backlinks,
    /// Plain-text extract + thumbnail.
    Summary,
    /// Daily view counts over the trailing window.
    Pageviews,
}

impl QueryKey {
    /// Fan-out order.
    pub const ALL: [QueryKey; 5] = [
        QueryKey::Metadata,
        QueryKey::Revisions,
        QueryKey::Backlinks,
        QueryKey::Summary,
        QueryKey::Pageviews,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryKey::Metadata => "metadata",
            QueryKey::Revisions => "revisions",
            QueryKey::Backlinks => "backlinks",
            QueryKey::Summary => "summary",
            QueryKey::Pageviews => "pageviews",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim a raw page title; `None` when nothing is left.
pub fn normalize_subject(raw: &str) -> Option<&str> {
    let subject = raw.trim();
    (!subject.is_empty()).then_some(subject)
}

/// One fully-formed remote read request plus its purpose tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub key: QueryKey,
    pub url: Url,
}

/// The trailing interval used for the page-view query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// `[today - 30 days, today]`.
    pub fn trailing(today: NaiveDate) -> Self {
        let from = today.checked_sub_days(Days::new(WINDOW_DAYS)).unwrap_or(NaiveDate::MIN);
        Self { from, to: today }
    }

    /// `YYYYMMDD` form of the lower bound.
    pub fn from_compact(&self) -> String {
        self.from.format("%Y%m%d").to_string()
    }

    /// `YYYYMMDD` form of the upper bound.
    pub fn to_compact(&self) -> String {
        self.to.format("%Y%m%d").to_string()
    }
}

/// Decoded payloads keyed by purpose, populated only once every target resolved.
#[derive(Debug, Clone, Default)]
pub struct RawResponseSet {
    payloads: BTreeMap<QueryKey, serde_json::Value>,
}

impl RawResponseSet {
    pub fn get(&self, key: QueryKey) -> Option<&serde_json::Value> {
        self.payloads.get(&key)
    }
}

impl FromIterator<(QueryKey, serde_json::Value)> for RawResponseSet {
    fn from_iter<I: IntoIterator<Item = (QueryKey, serde_json::Value)>>(iter: I) -> Self {
        Self {
            payloads: iter.into_iter().collect(),
        }
    }
}

/// One day of the page-view series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyViews {
    /// Upstream timestamp, `YYYYMMDDHH`.
    pub timestamp: String,
    pub views: u64,
}

/// The unified, fallback-complete result of aggregating every query for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub title: String,
    pub page_id: u64,
    /// Page size in bytes.
    pub length: u64,
    pub page_url: Option<String>,
    pub last_edit: Option<DateTime<Utc>>,
    pub current_revision_id: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    /// Comma-joined protection types, or `"None"`.
    pub protection: String,
    pub summary: String,
    pub thumbnail: Option<String>,
    pub links: Vec<String>,
    pub backlinks: Vec<String>,
    /// Sum over the 30-day window.
    pub total_views: u64,
    /// Rounded daily average over the 30-day window.
    pub avg_views: u64,
    /// Ordered by date.
    pub views: Vec<DailyViews>,
    pub unique_editors: usize,
    pub last_editor: String,
    pub language_count: usize,
}

impl MergedRecord {
    /// The `{value, label}` series consumed by the chart renderer.
    pub fn view_series(&self) -> Vec<SeriesPoint> {
        self.views
            .iter()
            .map(|d| SeriesPoint {
                value: d.views as f64,
                label: d.timestamp.clone(),
            })
            .collect()
    }
}

/// One point of a chart series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub value: f64,
    pub label: String,
}

impl SeriesPoint {
    pub fn new(value: f64, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// Logical size of the chart surface.
///
/// The plot area is the surface minus `margin` on all four sides, so a drawable
/// config needs `width > 2 * margin` and `height > 2 * margin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 200,
            margin: 40,
        }
    }
}

impl ChartConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        let min = self.margin.saturating_mul(2);
        if self.width <= min || self.height <= min {
            return Err(AppError::new(
                2,
                format!(
                    "Chart {}x{} leaves no plot area with a {} margin.",
                    self.width, self.height, self.margin
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subjects_are_trimmed_and_blanks_rejected() {
        assert_eq!(normalize_subject("  Rust (programming language) \n"), Some("Rust (programming language)"));
        assert_eq!(normalize_subject(" \t "), None);
        assert_eq!(normalize_subject(""), None);
    }

    #[test]
    fn trailing_window_spans_thirty_days() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let w = DateWindow::trailing(today);
        assert_eq!(w.from, NaiveDate::from_ymd_opt(2025, 2, 13).unwrap());
        assert_eq!(w.to, today);
        assert!(w.from <= w.to);
        assert_eq!((w.to - w.from).num_days(), 30);
        assert_eq!(w.from_compact(), "20250213");
        assert_eq!(w.to_compact(), "20250315");
    }

    #[test]
    fn view_series_preserves_order_and_labels() {
        let record = MergedRecord {
            title: "X".to_string(),
            page_id: 1,
            length: 0,
            page_url: None,
            last_edit: None,
            current_revision_id: None,
            created_at: None,
            protection: NO_PROTECTION.to_string(),
            summary: NOT_AVAILABLE.to_string(),
            thumbnail: None,
            links: vec![],
            backlinks: vec![],
            total_views: 3,
            avg_views: 2,
            views: vec![
                DailyViews { timestamp: "2025010100".to_string(), views: 1 },
                DailyViews { timestamp: "2025010200".to_string(), views: 2 },
            ],
            unique_editors: 0,
            last_editor: NOT_AVAILABLE.to_string(),
            language_count: 0,
        };

        let series = record.view_series();
        assert_eq!(series, vec![SeriesPoint::new(1.0, "2025010100"), SeriesPoint::new(2.0, "2025010200")]);
    }

    #[test]
    fn chart_config_requires_plot_area() {
        assert!(ChartConfig::default().validate().is_ok());
        let cramped = ChartConfig { width: 80, height: 200, margin: 40 };
        assert_eq!(cramped.validate().unwrap_err().exit_code(), 2);
    }
}
