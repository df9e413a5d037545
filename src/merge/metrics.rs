//! Derived metrics: view totals and editor statistics.

use std::collections::HashSet;

use crate::data::payload::{PageviewItem, Revision};
use crate::domain::{DailyViews, NOT_AVAILABLE};

/// Totals over the page-view window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStats {
    pub total: u64,
    /// `round(total / days)`, or 0 for an empty window.
    pub average: u64,
    pub daily: Vec<DailyViews>,
}

pub fn view_stats(items: &[PageviewItem]) -> ViewStats {
    let daily: Vec<DailyViews> = items
        .iter()
        .map(|item| DailyViews {
            timestamp: item.timestamp.clone().unwrap_or_default(),
            views: item.views.unwrap_or(0),
        })
        .collect();

    let total: u64 = daily.iter().map(|d| d.views).sum();
    let average = if daily.is_empty() {
        0
    } else {
        (total as f64 / daily.len() as f64).round() as u64
    };

    ViewStats { total, average, daily }
}

/// Editor statistics over an ascending revision list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorStats {
    pub unique_editors: usize,
    pub last_editor: String,
}

pub fn editor_stats(revisions: &[Revision]) -> EditorStats {
    // Hidden users have no name; they collapse into one identity.
    let unique_editors = revisions
        .iter()
        .map(|r| r.user.as_deref())
        .collect::<HashSet<_>>()
        .len();

    let last_editor = revisions
        .last()
        .and_then(|r| r.user.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    EditorStats {
        unique_editors,
        last_editor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(ts: &str, views: u64) -> PageviewItem {
        PageviewItem {
            timestamp: Some(ts.to_string()),
            views: Some(views),
        }
    }

    fn rev(user: &str) -> Revision {
        Revision {
            revid: None,
            user: Some(user.to_string()),
            timestamp: None,
        }
    }

    #[test]
    fn totals_and_rounded_average() {
        let stats = view_stats(&[day("2025010100", 10), day("2025010200", 20), day("2025010300", 30)]);
        assert_eq!(stats.total, 60);
        assert_eq!(stats.average, 20);
        assert_eq!(stats.daily.len(), 3);

        let stats = view_stats(&[day("a", 1), day("b", 2)]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.average, 2, "1.5 rounds half away from zero");
    }

    #[test]
    fn empty_window_has_zero_average() {
        let stats = view_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average, 0);
        assert!(stats.daily.is_empty());
    }

    #[test]
    fn missing_views_count_as_zero() {
        let stats = view_stats(&[PageviewItem { timestamp: None, views: None }, day("x", 4)]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.average, 2);
        assert_eq!(stats.daily[0].timestamp, "");
    }

    #[test]
    fn unique_and_last_editor() {
        let stats = editor_stats(&[rev("a"), rev("b"), rev("a")]);
        assert_eq!(stats.unique_editors, 2);
        assert_eq!(stats.last_editor, "a");

        let stats = editor_stats(&[rev("a"), rev("a"), rev("b")]);
        assert_eq!(stats.unique_editors, 2);
        assert_eq!(stats.last_editor, "b");
    }

    #[test]
    fn no_revisions_falls_back() {
        let stats = editor_stats(&[]);
        assert_eq!(stats.unique_editors, 0);
        assert_eq!(stats.last_editor, "N/A");
    }
}
