//! Formatted terminal output for a merged record.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays free of presentation concerns
//! - output changes are localized (easy to snapshot-test)

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::domain::{MergedRecord, NOT_AVAILABLE};

/// Longest title shown in the link lists before truncation.
const TITLE_WIDTH: usize = 60;

/// Format the full record report with timestamps in local time.
///
/// `max_items` caps each of the link lists; the rest is summarized as a count.
pub fn format_record(record: &MergedRecord, max_items: usize) -> String {
    format_record_in(record, max_items, &Local)
}

/// Same as [`format_record`], with timestamps shown in `tz`.
pub fn format_record_in<Tz>(record: &MergedRecord, max_items: usize, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", record.title));
    out.push_str(&format!("Page ID: {}\n", record.page_id));
    out.push_str(&format!("URL: {}\n", or_na(record.page_url.as_deref())));
    out.push_str(&format!("Length: {} bytes\n", record.length));
    out.push_str(&format!("Last edited: {}\n", fmt_time(record.last_edit, tz)));
    out.push_str(&format!(
        "Current revision: {}\n",
        record
            .current_revision_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    ));
    out.push_str(&format!("Created: {}\n", fmt_time(record.created_at, tz)));
    out.push_str(&format!("Protection: {}\n", record.protection));
    out.push_str(&format!("Languages: {}\n", record.language_count));
    out.push_str(&format!("Thumbnail: {}\n", or_na(record.thumbnail.as_deref())));

    out.push_str("\nSummary:\n");
    out.push_str(&record.summary);
    out.push('\n');

    out.push_str("\nPage views (last 30 days):\n");
    out.push_str(&format!("  Total: {}\n", record.total_views));
    out.push_str(&format!("  Daily average: {}\n", record.avg_views));

    out.push_str("\nEditors:\n");
    out.push_str(&format!("  Unique: {}\n", record.unique_editors));
    out.push_str(&format!("  Last: {}\n", record.last_editor));

    out.push('\n');
    out.push_str(&format_titles("Links", &record.links, "No links found.", max_items));
    out.push('\n');
    out.push_str(&format_titles("Backlinks", &record.backlinks, "No backlinks found.", max_items));

    out
}

fn format_titles(heading: &str, titles: &[String], empty: &str, max_items: usize) -> String {
    let mut out = format!("{heading} ({}):\n", titles.len());
    if titles.is_empty() {
        out.push_str(&format!("  {empty}\n"));
        return out;
    }

    for title in titles.iter().take(max_items) {
        out.push_str(&format!("  - {}\n", truncate(title, TITLE_WIDTH)));
    }
    if titles.len() > max_items {
        out.push_str(&format!("  ... and {} more\n", titles.len() - max_items));
    }
    out
}

fn fmt_time<Tz>(ts: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match ts {
        Some(ts) => ts.with_timezone(tz).format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn or_na(v: Option<&str>) -> &str {
    v.unwrap_or(NOT_AVAILABLE)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
