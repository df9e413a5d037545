//! Reduce the five raw payloads into one `MergedRecord`.
//!
//! The order of checks matters: the metadata page is resolved (and a missing page
//! rejected) before any other payload is decoded.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::data::payload::{
    PageEntry, PageviewsPayload, QueryEnvelope, Revision, SummaryPayload, decode,
};
use crate::domain::{MergedRecord, NO_PROTECTION, NOT_AVAILABLE, QueryKey, RawResponseSet};
use crate::error::FetchError;
use crate::merge::metrics::{editor_stats, view_stats};

/// Merge a complete response set for `subject`.
///
/// Either every field is filled (falling back where upstream omitted data) or the
/// whole merge fails.
pub fn merge_record(subject: &str, raw: &RawResponseSet) -> Result<MergedRecord, FetchError> {
    let page = select_page(raw)?;

    let revisions = reconcile_revisions(&page, raw)?;
    let backlinks = backlink_titles(raw)?;
    let summary: SummaryPayload = decode(QueryKey::Summary, payload(raw, QueryKey::Summary)?)?;
    let pageviews: PageviewsPayload = decode(QueryKey::Pageviews, payload(raw, QueryKey::Pageviews)?)?;

    let editors = editor_stats(&revisions);
    let views = view_stats(pageviews.items.as_deref().unwrap_or_default());

    Ok(MergedRecord {
        title: page.title.clone().unwrap_or_else(|| subject.to_string()),
        page_id: page.pageid.unwrap_or(0),
        length: page.length.unwrap_or(0),
        page_url: page.fullurl.clone(),
        last_edit: page.touched.as_deref().and_then(parse_timestamp),
        current_revision_id: revisions.last().and_then(|r| r.revid),
        created_at: revisions
            .first()
            .and_then(|r| r.timestamp.as_deref())
            .and_then(parse_timestamp),
        protection: protection_status(&page),
        summary: summary.extract.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        thumbnail: summary.thumbnail.and_then(|t| t.source),
        links: titles(page.links.as_deref()),
        backlinks,
        total_views: views.total,
        avg_views: views.average,
        views: views.daily,
        unique_editors: editors.unique_editors,
        last_editor: editors.last_editor,
        language_count: page.langlinks.as_ref().map_or(0, Vec::len),
    })
}

fn payload(raw: &RawResponseSet, key: QueryKey) -> Result<&serde_json::Value, FetchError> {
    raw.get(key)
        .ok_or_else(|| FetchError::Malformed(format!("no {key} payload in response set")))
}

/// The single page of the metadata response.
///
/// Pages are keyed by numeric id, not by the requested title, so the entry is taken
/// by position rather than by key; see `first_page` for the order.
fn select_page(raw: &RawResponseSet) -> Result<PageEntry, FetchError> {
    let envelope: QueryEnvelope = decode(QueryKey::Metadata, payload(raw, QueryKey::Metadata)?)?;
    let pages = envelope
        .query
        .and_then(|q| q.pages)
        .ok_or_else(|| FetchError::Malformed("metadata payload has no query.pages".to_string()))?;

    let page = first_page(pages).ok_or(FetchError::NotFound)?;
    if page.is_missing() {
        return Err(FetchError::NotFound);
    }
    Ok(page)
}

/// Embedded revisions win; otherwise use the dedicated revision-history response.
fn reconcile_revisions(page: &PageEntry, raw: &RawResponseSet) -> Result<Vec<Revision>, FetchError> {
    if let Some(revisions) = &page.revisions {
        return Ok(revisions.clone());
    }

    let envelope: QueryEnvelope = decode(QueryKey::Revisions, payload(raw, QueryKey::Revisions)?)?;
    let Some(mut pages) = envelope.query.and_then(|q| q.pages) else {
        debug!("revision payload carries no pages");
        return Ok(Vec::new());
    };

    let by_id = page.pageid.and_then(|id| pages.remove(&id.to_string()));
    let entry = by_id.or_else(|| first_page(pages));
    Ok(entry.and_then(|p| p.revisions).unwrap_or_default())
}

/// First page in the order the API lists them: canonical non-negative ids
/// numerically ascending, then any other keys (e.g. `"-1"` for missing pages).
///
/// The map itself sorts keys as strings, which would put `"10"` before `"9"`.
fn first_page(pages: BTreeMap<String, PageEntry>) -> Option<PageEntry> {
    pages
        .into_iter()
        .min_by_key(|(id, _)| match id.parse::<u64>() {
            Ok(n) if n.to_string() == *id => (false, n),
            _ => (true, 0),
        })
        .map(|(_, page)| page)
}

fn backlink_titles(raw: &RawResponseSet) -> Result<Vec<String>, FetchError> {
    let envelope: QueryEnvelope = decode(QueryKey::Backlinks, payload(raw, QueryKey::Backlinks)?)?;
    Ok(titles(envelope.query.and_then(|q| q.backlinks).as_deref()))
}

fn titles(refs: Option<&[crate::data::payload::TitleRef]>) -> Vec<String> {
    refs.unwrap_or_default()
        .iter()
        .filter_map(|r| r.title.clone())
        .collect()
}

fn protection_status(page: &PageEntry) -> String {
    let kinds: Vec<&str> = page
        .protection
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|p| p.kind.as_deref())
        .collect();

    if kinds.is_empty() {
        NO_PROTECTION.to_string()
    } else {
        kinds.join(", ")
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            debug!("ignoring unparseable timestamp '{raw}': {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn response_set(metadata: Value, revisions: Value, backlinks: Value, summary: Value, pageviews: Value) -> RawResponseSet {
        [
            (QueryKey::Metadata, metadata),
            (QueryKey::Revisions, revisions),
            (QueryKey::Backlinks, backlinks),
            (QueryKey::Summary, summary),
            (QueryKey::Pageviews, pageviews),
        ]
        .into_iter()
        .collect()
    }

    fn full_metadata() -> Value {
        json!({
            "batchcomplete": "",
            "query": {"pages": {"4242": {
                "pageid": 4242,
                "ns": 0,
                "title": "Rust (programming language)",
                "length": 98765,
                "touched": "2025-03-14T08:30:00Z",
                "fullurl": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
                "protection": [
                    {"type": "edit", "level": "autoconfirmed", "expiry": "infinity"},
                    {"type": "move", "level": "sysop", "expiry": "infinity"}
                ],
                "langlinks": [{"lang": "de", "title": "Rust"}, {"lang": "fr", "title": "Rust"}],
                "links": [{"ns": 0, "title": "Cargo"}, {"ns": 0, "title": "LLVM"}]
            }}}
        })
    }

    fn revisions_payload() -> Value {
        json!({"query": {"pages": {"4242": {"pageid": 4242, "revisions": [
            {"revid": 1, "parentid": 0, "user": "a", "timestamp": "2006-07-01T10:00:00Z"},
            {"revid": 2, "parentid": 1, "user": "b", "timestamp": "2010-01-01T00:00:00Z"},
            {"revid": 3, "parentid": 2, "user": "a", "timestamp": "2025-03-14T08:29:00Z"}
        ]}}}})
    }

    fn pageviews_payload() -> Value {
        json!({"items": [
            {"article": "Rust", "timestamp": "2025031300", "views": 10},
            {"article": "Rust", "timestamp": "2025031400", "views": 20},
            {"article": "Rust", "timestamp": "2025031500", "views": 30}
        ]})
    }

    #[test]
    fn merges_every_source() {
        let raw = response_set(
            full_metadata(),
            revisions_payload(),
            json!({"query": {"backlinks": [{"pageid": 1, "title": "Cargo"}, {"pageid": 2, "title": "Ferris"}]}}),
            json!({"extract": "Rust is a language.", "thumbnail": {"source": "https://upload.example/rust.png"}}),
            pageviews_payload(),
        );

        let record = merge_record("rust", &raw).unwrap();
        assert_eq!(record.title, "Rust (programming language)");
        assert_eq!(record.page_id, 4242);
        assert_eq!(record.length, 98765);
        assert_eq!(record.last_edit, Some(Utc.with_ymd_and_hms(2025, 3, 14, 8, 30, 0).unwrap()));
        assert_eq!(record.created_at, Some(Utc.with_ymd_and_hms(2006, 7, 1, 10, 0, 0).unwrap()));
        assert_eq!(record.current_revision_id, Some(3));
        assert_eq!(record.protection, "edit, move");
        assert_eq!(record.summary, "Rust is a language.");
        assert_eq!(record.thumbnail.as_deref(), Some("https://upload.example/rust.png"));
        assert_eq!(record.links, vec!["Cargo", "LLVM"]);
        assert_eq!(record.backlinks, vec!["Cargo", "Ferris"]);
        assert_eq!(record.total_views, 60);
        assert_eq!(record.avg_views, 20);
        assert_eq!(record.views.len(), 3);
        assert_eq!(record.unique_editors, 2);
        assert_eq!(record.last_editor, "a");
        assert_eq!(record.language_count, 2);
        assert!(record.page_url.is_some());
    }

    #[test]
    fn sparse_payloads_fall_back_everywhere() {
        let raw = response_set(
            json!({"query": {"pages": {"77": {"pageid": 77}}}}),
            json!({}),
            json!({}),
            json!({}),
            json!({}),
        );

        let record = merge_record("Bare", &raw).unwrap();
        assert_eq!(record.title, "Bare");
        assert_eq!(record.page_id, 77);
        assert_eq!(record.length, 0);
        assert_eq!(record.last_edit, None);
        assert_eq!(record.created_at, None);
        assert_eq!(record.current_revision_id, None);
        assert_eq!(record.protection, "None");
        assert_eq!(record.summary, "N/A");
        assert_eq!(record.thumbnail, None);
        assert!(record.links.is_empty());
        assert!(record.backlinks.is_empty());
        assert_eq!(record.total_views, 0);
        assert_eq!(record.avg_views, 0);
        assert_eq!(record.unique_editors, 0);
        assert_eq!(record.last_editor, "N/A");
        assert_eq!(record.language_count, 0);
    }

    #[test]
    fn embedded_revisions_take_precedence() {
        let metadata = json!({"query": {"pages": {"9": {
            "pageid": 9,
            "title": "Nine",
            "revisions": [{"revid": 90, "user": "z", "timestamp": "2020-02-02T00:00:00Z"}]
        }}}});
        let raw = response_set(metadata, revisions_payload(), json!({}), json!({}), json!({}));

        let record = merge_record("Nine", &raw).unwrap();
        assert_eq!(record.current_revision_id, Some(90));
        assert_eq!(record.last_editor, "z");
        assert_eq!(record.unique_editors, 1);
    }

    #[test]
    fn revision_response_is_matched_by_page_id_first() {
        let revisions = json!({"query": {"pages": {
            "1": {"pageid": 1, "revisions": [{"revid": 11, "user": "other"}]},
            "4242": {"pageid": 4242, "revisions": [{"revid": 5, "user": "mine"}]}
        }}});
        let raw = response_set(full_metadata(), revisions, json!({}), json!({}), json!({}));

        let record = merge_record("rust", &raw).unwrap();
        assert_eq!(record.current_revision_id, Some(5));
        assert_eq!(record.last_editor, "mine");
    }

    #[test]
    fn missing_page_is_not_found_before_other_payloads_are_read() {
        // Every other payload is structurally broken; only the metadata is consulted.
        let raw = response_set(
            json!({"query": {"pages": {"-1": {"ns": 0, "title": "Nope", "missing": ""}}}}),
            json!([]),
            json!([]),
            json!([]),
            json!([]),
        );
        assert_eq!(merge_record("Nope", &raw).unwrap_err(), FetchError::NotFound);
    }

    #[test]
    fn page_ids_are_ordered_numerically() {
        let raw = response_set(
            json!({"query": {"pages": {
                "10": {"pageid": 10, "title": "Ten"},
                "9": {"pageid": 9, "title": "Nine"},
                "-1": {"title": "Gone", "missing": ""}
            }}}),
            json!({}),
            json!({}),
            json!({}),
            json!({}),
        );

        let record = merge_record("x", &raw).unwrap();
        assert_eq!(record.title, "Nine");
        assert_eq!(record.page_id, 9);
    }

    #[test]
    fn empty_pages_map_is_not_found() {
        let raw = response_set(json!({"query": {"pages": {}}}), json!({}), json!({}), json!({}), json!({}));
        assert_eq!(merge_record("x", &raw).unwrap_err(), FetchError::NotFound);
    }

    #[test]
    fn missing_query_pages_is_malformed() {
        let raw = response_set(json!({"batchcomplete": ""}), json!({}), json!({}), json!({}), json!({}));
        let err = merge_record("x", &raw).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn structurally_broken_pageviews_abort_the_merge() {
        let raw = response_set(full_metadata(), revisions_payload(), json!({}), json!({}), json!({"items": 5}));
        assert!(matches!(merge_record("x", &raw), Err(FetchError::Malformed(_))));
    }
}
