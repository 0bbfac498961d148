//! Domain types for multi-site wiki synchronization.
//!
//! Timestamps are always stored as `DateTime<Utc>`; conversion to the
//! human-readable display timezone happens only when rendering markers.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Edit summary written on every bot-authored edit and upload.
///
/// Its presence as the latest comment on a page is the sole signal a later
/// round uses to recognize bot-authored history (loop prevention).
pub const SYNC_COMMENT: &str = "Wiki-Bot 同步更新";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed key for a site in the configuration map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(pub String);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SiteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SiteId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Sites
// ---------------------------------------------------------------------------

/// Bot account credentials for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bot_name: String,
    pub bot_password: String,
}

/// One independently editable wiki instance participating in a run.
///
/// Immutable for the duration of a run; owned by the orchestrator's site
/// registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiSite {
    pub id: SiteId,
    /// Full URL of the site's `api.php` endpoint.
    pub base_url: String,
    /// Human-readable name used in provenance markers.
    pub display_name: String,
    pub credentials: Credentials,
}

// ---------------------------------------------------------------------------
// Revisions and feed entries
// ---------------------------------------------------------------------------

/// The current revision of one title on one site.
///
/// Produced by a read call; never mutated, superseded by a newer fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub site: SiteId,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub comment: String,
    pub content: String,
}

/// One entry from a site's recent-changes feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub comment: String,
}

/// One entry from a site's recent-uploads feed. Carries the direct file URL
/// so file sync can download without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEntry {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub comment: String,
    pub url: String,
}

/// Common view over anything a site reports about a title at a point in
/// time. Discovery merges these; arbitration selects among them.
pub trait SiteEvent {
    fn title(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
    fn comment(&self) -> &str;
}

impl SiteEvent for Revision {
    fn title(&self) -> &str {
        &self.title
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn comment(&self) -> &str {
        &self.comment
    }
}

impl SiteEvent for ChangeEntry {
    fn title(&self) -> &str {
        &self.title
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn comment(&self) -> &str {
        &self.comment
    }
}

impl SiteEvent for UploadEntry {
    fn title(&self) -> &str {
        &self.title
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn comment(&self) -> &str {
        &self.comment
    }
}

/// Sentinel standing in for "this site has never edited the title".
/// Any real revision timestamp compares greater.
pub fn absent_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// ---------------------------------------------------------------------------
// Discovery and outcomes
// ---------------------------------------------------------------------------

/// A title needing inspection, with the newest change timestamp any site
/// reported for it inside the observation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub title: String,
    pub last_seen: DateTime<Utc>,
}

/// Per (title, target site) result of one propagation attempt.
/// Consumed only for logging and CLI output, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Skipped(String),
    Updated,
    Failed(String),
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Skipped(reason) => write!(f, "skipped ({reason})"),
            SyncOutcome::Updated => write!(f, "updated"),
            SyncOutcome::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_id_display_and_ordering() {
        assert_eq!(SiteId::from("reko").to_string(), "reko");
        assert!(SiteId::from("a") < SiteId::from("b"));
    }

    #[test]
    fn absent_timestamp_is_older_than_any_real_edit() {
        let real = Utc.with_ymd_and_hms(2003, 1, 1, 0, 0, 0).unwrap();
        assert!(absent_timestamp() < real);
    }

    #[test]
    fn sync_outcome_display() {
        assert_eq!(SyncOutcome::Updated.to_string(), "updated");
        assert_eq!(
            SyncOutcome::Skipped("already in sync".into()).to_string(),
            "skipped (already in sync)"
        );
    }
}
