//! Change discovery — merge per-site "recently changed" feeds into one
//! globally time-ordered list of titles needing inspection.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use mirrorbot_core::client::WikiClient;
use mirrorbot_core::types::{ChangeRecord, SiteEvent, SiteId, UploadEntry, SYNC_COMMENT};

use crate::orchestrator::SiteHandle;

/// Per-site snapshot of upload entries captured during discovery, keyed by
/// title. File sync arbitrates over this instead of re-querying each site.
pub type FileIndex = BTreeMap<SiteId, HashMap<String, UploadEntry>>;

/// Merge per-site feed slices into one ascending title queue.
///
/// Entries carrying the bot's own synchronization comment are artifacts of
/// a prior round and are dropped. For each surviving title the maximum
/// timestamp seen on any site is kept; the result is ordered oldest-changed
/// first (title as secondary key, for determinism).
pub fn merge_feeds<E: SiteEvent>(feeds: &[Vec<E>]) -> Vec<ChangeRecord> {
    let mut newest: BTreeMap<String, chrono::DateTime<chrono::Utc>> = BTreeMap::new();
    for feed in feeds {
        for entry in feed {
            if entry.comment() == SYNC_COMMENT {
                continue;
            }
            newest
                .entry(entry.title().to_owned())
                .and_modify(|ts| *ts = (*ts).max(entry.timestamp()))
                .or_insert_with(|| entry.timestamp());
        }
    }

    let mut records: Vec<ChangeRecord> = newest
        .into_iter()
        .map(|(title, last_seen)| ChangeRecord { title, last_seen })
        .collect();
    records.sort_by(|a, b| (a.last_seen, &a.title).cmp(&(b.last_seen, &b.title)));
    records
}

/// Titles with page edits on `date`, across all sites.
///
/// A site that cannot be queried contributes nothing and is logged; only a
/// totally empty result makes the run a no-op.
pub fn changed_pages<C: WikiClient>(
    sites: &BTreeMap<SiteId, SiteHandle<C>>,
    date: NaiveDate,
) -> Vec<ChangeRecord> {
    let mut feeds = Vec::with_capacity(sites.len());
    for (id, handle) in sites {
        match handle.client.recent_changes(date) {
            Ok(entries) => {
                tracing::debug!("{id}: {} recent change(s) on {date}", entries.len());
                feeds.push(entries);
            }
            Err(e) => tracing::warn!("{id}: recent-changes query failed, skipping site: {e}"),
        }
    }
    merge_feeds(&feeds)
}

/// Titles with file uploads on `date`, plus the per-site upload snapshot
/// needed to download and compare the files later.
pub fn changed_files<C: WikiClient>(
    sites: &BTreeMap<SiteId, SiteHandle<C>>,
    date: NaiveDate,
) -> (Vec<ChangeRecord>, FileIndex) {
    let mut feeds = Vec::with_capacity(sites.len());
    let mut index = FileIndex::new();
    for (id, handle) in sites {
        match handle.client.recent_uploads(date) {
            Ok(entries) => {
                let by_title = entries
                    .iter()
                    .map(|e| (e.title.clone(), e.clone()))
                    .collect();
                index.insert(id.clone(), by_title);
                feeds.push(entries);
            }
            Err(e) => tracing::warn!("{id}: recent-uploads query failed, skipping site: {e}"),
        }
    }
    (merge_feeds(&feeds), index)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use mirrorbot_core::types::ChangeEntry;

    use super::*;

    fn entry(title: &str, secs: i64, comment: &str) -> ChangeEntry {
        ChangeEntry {
            title: title.to_owned(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            user: "someone".to_owned(),
            comment: comment.to_owned(),
        }
    }

    #[test]
    fn merges_keeping_maximum_timestamp_per_title() {
        let feeds = vec![
            vec![entry("Foo", 100, "edit"), entry("Bar", 50, "edit")],
            vec![entry("Foo", 300, "edit")],
        ];
        let records = merge_feeds(&feeds);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Bar");
        assert_eq!(records[1].title, "Foo");
        assert_eq!(records[1].last_seen, Utc.timestamp_opt(300, 0).unwrap());
    }

    #[test]
    fn orders_ascending_by_timestamp() {
        let feeds = vec![vec![
            entry("Newest", 900, "edit"),
            entry("Oldest", 100, "edit"),
            entry("Middle", 500, "edit"),
        ]];
        let titles: Vec<String> = merge_feeds(&feeds).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Oldest", "Middle", "Newest"]);
    }

    #[test]
    fn equal_timestamps_order_by_title() {
        let feeds = vec![vec![entry("B", 100, "e"), entry("A", 100, "e")]];
        let titles: Vec<String> = merge_feeds(&feeds).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn bot_authored_entries_are_dropped() {
        let feeds = vec![vec![
            entry("Echo", 100, SYNC_COMMENT),
            entry("Human", 50, "fix typo"),
        ]];
        let records = merge_feeds(&feeds);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Human");
    }

    #[test]
    fn bot_comment_on_one_site_does_not_hide_human_edit_elsewhere() {
        let feeds = vec![
            vec![entry("Foo", 200, SYNC_COMMENT)],
            vec![entry("Foo", 100, "human edit")],
        ];
        let records = merge_feeds(&feeds);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].last_seen, Utc.timestamp_opt(100, 0).unwrap());
    }

    #[test]
    fn empty_feeds_produce_no_records() {
        let feeds: Vec<Vec<ChangeEntry>> = vec![vec![], vec![]];
        assert!(merge_feeds(&feeds).is_empty());
    }
}
