//! Sync orchestration — drives the per-title pipeline across all sites
//! with namespace exclusion, per-title failure isolation, and pacing.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;

use mirrorbot_core::client::{CaptchaAnswer, WikiClient};
use mirrorbot_core::types::{
    ChangeRecord, Revision, SiteId, SyncOutcome, UploadEntry, WikiSite, SYNC_COMMENT,
};

use crate::arbiter::{arbitrate, Arbitration};
use crate::discovery::{self, FileIndex};
use crate::error::SyncError;
use crate::session::SessionPool;
use crate::{challenge, transform};

/// Reserved title prefixes that must never be synchronized, with the label
/// used when logging the skip.
const EXCLUDED_PREFIXES: &[(&str, &str)] = &[
    ("首頁", "home page"),
    ("檔案", "file page"),
    ("使用者", "user page"),
    ("特殊", "special page"),
    ("討論:", "talk page"),
    ("模板:Mirrorpage", "mirror marker template"),
    ("模板:Synchro", "sync marker template"),
];

/// One site in the registry: its immutable identity plus the client that
/// talks to it.
pub struct SiteHandle<C> {
    pub site: WikiSite,
    pub client: C,
}

/// Final state of one title's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleStatus {
    /// Reserved prefix; no network calls were made.
    Excluded { label: &'static str },
    /// No site has the title.
    NotFound,
    /// The newest revision is a prior bot write; nothing to do this round.
    AlreadySynchronized { site: SiteId },
    /// Propagation ran; one outcome per non-authoritative site.
    Propagated {
        source: SiteId,
        outcomes: Vec<(SiteId, SyncOutcome)>,
    },
    /// Something inside the pipeline failed; isolated at the title
    /// boundary.
    Failed { detail: String },
}

/// Per-title report handed back to the caller for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleReport {
    pub title: String,
    pub status: TitleStatus,
}

/// Drives page and file synchronization across the site registry.
pub struct Orchestrator<C: WikiClient> {
    sites: BTreeMap<SiteId, SiteHandle<C>>,
    pacing: Duration,
}

impl<C: WikiClient> Orchestrator<C> {
    pub fn new(sites: BTreeMap<SiteId, SiteHandle<C>>) -> Self {
        Self {
            sites,
            pacing: Duration::from_secs(1),
        }
    }

    /// Override the pause inserted after each title. Production keeps the
    /// one-second default to stay under third-party rate limits.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Titles with page edits on `date`, merged across all sites.
    pub fn discover_changed_pages(&self, date: NaiveDate) -> Vec<ChangeRecord> {
        discovery::changed_pages(&self.sites, date)
    }

    // -----------------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------------

    /// Run the page pipeline for each title in order.
    ///
    /// Sessions for all sites are held for the whole batch and released on
    /// return. Failures are isolated per title; the queue always runs to
    /// completion.
    pub fn sync_pages(&self, titles: &[String]) -> Vec<TitleReport> {
        let pool = SessionPool::open(&self.sites);
        let mut reports = Vec::with_capacity(titles.len());
        for title in titles {
            let status = match self.sync_page(&pool, title) {
                Ok(status) => status,
                Err(e) => TitleStatus::Failed {
                    detail: e.to_string(),
                },
            };
            self.log_status(title, &status);
            reports.push(TitleReport {
                title: title.clone(),
                status,
            });
            std::thread::sleep(self.pacing);
        }
        reports
    }

    fn sync_page(
        &self,
        pool: &SessionPool<'_, C>,
        title: &str,
    ) -> Result<TitleStatus, SyncError> {
        if let Some(label) = excluded_prefix(title) {
            return Ok(TitleStatus::Excluded { label });
        }

        let mut revisions: BTreeMap<SiteId, Option<Revision>> = BTreeMap::new();
        for (id, handle) in &self.sites {
            revisions.insert(id.clone(), handle.client.fetch_revision(title)?);
        }

        let (source_id, source) = match arbitrate(&revisions) {
            Arbitration::NotFound => return Ok(TitleStatus::NotFound),
            Arbitration::AlreadySynchronized { site } => {
                return Ok(TitleStatus::AlreadySynchronized { site })
            }
            Arbitration::Source { site, event } => (site, event.clone()),
        };

        let class = transform::classify(title, &source.content);
        let stripped = transform::strip_markers(&source.content, class);
        let source_name = self
            .sites
            .get(&source_id)
            .map(|h| h.site.display_name.clone())
            .unwrap_or_else(|| source_id.to_string());

        let mut outcomes = Vec::new();
        for (id, handle) in &self.sites {
            if *id == source_id {
                continue;
            }
            let existing = revisions.get(id).and_then(|r| r.as_ref());
            let outcome = self.propagate_page(
                pool,
                id,
                handle,
                title,
                existing,
                &stripped,
                class,
                &source_name,
                &source,
            );
            outcomes.push((id.clone(), outcome));
        }

        Ok(TitleStatus::Propagated {
            source: source_id,
            outcomes,
        })
    }

    /// Propagate the authoritative content to one target site. Never
    /// returns an error: write problems become `SyncOutcome::Failed` so the
    /// remaining sites for this title are still attempted.
    #[allow(clippy::too_many_arguments)]
    fn propagate_page(
        &self,
        pool: &SessionPool<'_, C>,
        id: &SiteId,
        handle: &SiteHandle<C>,
        title: &str,
        existing: Option<&Revision>,
        stripped: &str,
        class: transform::PageClass,
        source_name: &str,
        source: &Revision,
    ) -> SyncOutcome {
        let text = match existing {
            // A fresh copy diverges from nothing; it carries no marker.
            None => stripped.to_owned(),
            Some(revision) => {
                if transform::normalized_equal(stripped, &revision.content, class) {
                    return SyncOutcome::Skipped("already in sync".to_owned());
                }
                transform::insert_marker(stripped, class, source_name, source.timestamp)
            }
        };

        let Some(session) = pool.session(id) else {
            return SyncOutcome::Failed("no open session".to_owned());
        };
        match self.write_with_challenge(handle, session, title, &text) {
            Ok(()) => SyncOutcome::Updated,
            Err(e) => SyncOutcome::Failed(e.to_string()),
        }
    }

    /// Post an edit; when the site answers with an arithmetic challenge,
    /// solve it and resubmit exactly once.
    fn write_with_challenge(
        &self,
        handle: &SiteHandle<C>,
        session: &C::Session,
        title: &str,
        text: &str,
    ) -> Result<(), SyncError> {
        let first = handle
            .client
            .post_edit(session, title, text, SYNC_COMMENT, None)?;
        if first.success {
            return Ok(());
        }

        let Some(captcha) = first.captcha else {
            return Err(SyncError::EditRejected {
                detail: first.detail.unwrap_or_else(|| "no detail".to_owned()),
            });
        };
        let answer = challenge::solve(&captcha.question).ok_or_else(|| {
            SyncError::UnsolvableChallenge {
                question: captcha.question.clone(),
            }
        })?;
        let second = handle.client.post_edit(
            session,
            title,
            text,
            SYNC_COMMENT,
            Some(&CaptchaAnswer {
                id: captcha.id,
                answer,
            }),
        )?;
        if second.success {
            Ok(())
        } else {
            Err(SyncError::ChallengeRejected {
                detail: second.detail.unwrap_or_else(|| "no detail".to_owned()),
            })
        }
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    /// Discover and propagate files uploaded on `date`.
    ///
    /// Exclusion prefixes do not apply here: upload feed titles already
    /// live in the file namespace, and the discovery snapshot is the only
    /// lookup the pipeline needs.
    pub fn sync_files(&self, date: NaiveDate) -> Vec<TitleReport> {
        let (records, index) = discovery::changed_files(&self.sites, date);
        if records.is_empty() {
            tracing::info!("no recently uploaded files on {date}");
            return Vec::new();
        }

        let pool = SessionPool::open(&self.sites);
        let mut reports = Vec::with_capacity(records.len());
        for record in &records {
            let status = match self.sync_file(&pool, &record.title, &index) {
                Ok(status) => status,
                Err(e) => TitleStatus::Failed {
                    detail: e.to_string(),
                },
            };
            self.log_status(&record.title, &status);
            reports.push(TitleReport {
                title: record.title.clone(),
                status,
            });
            std::thread::sleep(self.pacing);
        }
        reports
    }

    fn sync_file(
        &self,
        pool: &SessionPool<'_, C>,
        title: &str,
        index: &FileIndex,
    ) -> Result<TitleStatus, SyncError> {
        let candidates: BTreeMap<SiteId, Option<UploadEntry>> = self
            .sites
            .keys()
            .map(|id| {
                let entry = index.get(id).and_then(|m| m.get(title)).cloned();
                (id.clone(), entry)
            })
            .collect();

        let (source_id, source) = match arbitrate(&candidates) {
            Arbitration::NotFound => return Ok(TitleStatus::NotFound),
            Arbitration::AlreadySynchronized { site } => {
                return Ok(TitleStatus::AlreadySynchronized { site })
            }
            Arbitration::Source { site, event } => (site, event.clone()),
        };

        let source_handle = self.sites.get(&source_id);
        let source_bytes = match source_handle {
            Some(handle) => {
                handle
                    .client
                    .download(&source.url)
                    .map_err(|e| SyncError::SourceFileUnavailable {
                        detail: e.to_string(),
                    })?
            }
            None => {
                return Err(SyncError::SourceFileUnavailable {
                    detail: format!("no handle for site {source_id}"),
                })
            }
        };

        let mut outcomes = Vec::new();
        for (id, handle) in &self.sites {
            if *id == source_id {
                continue;
            }
            let existing = candidates.get(id).and_then(|e| e.as_ref());
            let outcome =
                self.propagate_file(pool, id, handle, title, existing, &source_bytes);
            outcomes.push((id.clone(), outcome));
        }

        Ok(TitleStatus::Propagated {
            source: source_id,
            outcomes,
        })
    }

    fn propagate_file(
        &self,
        pool: &SessionPool<'_, C>,
        id: &SiteId,
        handle: &SiteHandle<C>,
        title: &str,
        existing: Option<&UploadEntry>,
        source_bytes: &[u8],
    ) -> SyncOutcome {
        if let Some(entry) = existing {
            match handle.client.download(&entry.url) {
                Ok(bytes) if bytes == source_bytes => {
                    return SyncOutcome::Skipped("already in sync".to_owned());
                }
                Ok(_) => {}
                Err(e) => return SyncOutcome::Failed(format!("download failed: {e}")),
            }
        }

        let Some(session) = pool.session(id) else {
            return SyncOutcome::Failed("no open session".to_owned());
        };
        match handle
            .client
            .upload_file(session, title, source_bytes, SYNC_COMMENT)
        {
            Ok(outcome) if outcome.success => SyncOutcome::Updated,
            Ok(outcome) => SyncOutcome::Failed(
                outcome.detail.unwrap_or_else(|| "upload rejected".to_owned()),
            ),
            Err(e) => SyncOutcome::Failed(e.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Logging
    // -----------------------------------------------------------------------

    fn log_status(&self, title: &str, status: &TitleStatus) {
        match status {
            TitleStatus::Excluded { label } => {
                tracing::info!("{title}: excluded ({label})");
            }
            TitleStatus::NotFound => tracing::warn!("{title}: not found on any site"),
            TitleStatus::AlreadySynchronized { site } => {
                tracing::info!("{title}: already synchronized (newest on {site} is a bot write)");
            }
            TitleStatus::Propagated { source, outcomes } => {
                for (site, outcome) in outcomes {
                    match outcome {
                        SyncOutcome::Failed(_) => {
                            tracing::error!("{title}: {source} -> {site}: {outcome}");
                        }
                        _ => tracing::info!("{title}: {source} -> {site}: {outcome}"),
                    }
                }
            }
            TitleStatus::Failed { detail } => tracing::error!("{title}: failed: {detail}"),
        }
    }
}

/// Label of the reserved prefix matching `title`, if any.
fn excluded_prefix(title: &str) -> Option<&'static str> {
    EXCLUDED_PREFIXES
        .iter()
        .find(|(prefix, _)| title.starts_with(prefix))
        .map(|(_, label)| *label)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_prefixes_are_excluded() {
        assert_eq!(excluded_prefix("首頁"), Some("home page"));
        assert_eq!(excluded_prefix("檔案:Foo.png"), Some("file page"));
        assert_eq!(excluded_prefix("使用者:Bob"), Some("user page"));
        assert_eq!(excluded_prefix("特殊:最近更改"), Some("special page"));
        assert_eq!(excluded_prefix("討論:Foo"), Some("talk page"));
        assert_eq!(
            excluded_prefix("模板:Mirrorpage"),
            Some("mirror marker template")
        );
        assert_eq!(
            excluded_prefix("模板:Synchro"),
            Some("sync marker template")
        );
    }

    #[test]
    fn ordinary_and_template_titles_are_not_excluded() {
        assert_eq!(excluded_prefix("Foo"), None);
        assert_eq!(excluded_prefix("模板:Infobox"), None);
    }
}
