//! Revision arbitration — pick the authoritative site for one title and
//! recognize the engine's own echoes.

use std::collections::BTreeMap;

use mirrorbot_core::types::{absent_timestamp, SiteId, SiteEvent, SYNC_COMMENT};

/// Result of arbitrating one title across all sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arbitration<'a, T> {
    /// No site has the title.
    NotFound,
    /// The newest revision is a bot-authored write from a prior round;
    /// treating it as a source would propagate forever.
    AlreadySynchronized { site: SiteId },
    /// The selected propagation source.
    Source { site: SiteId, event: &'a T },
}

/// Select the authoritative event for a title.
///
/// Absence behaves as a timestamp far in the past, so any real revision
/// beats a missing page. Selection is by strictly-maximum timestamp; among
/// equal timestamps the lexicographically smallest site id wins, which
/// keeps reruns deterministic (the input map iterates in key order and a
/// later candidate must be strictly newer to displace the current best).
pub fn arbitrate<T: SiteEvent>(candidates: &BTreeMap<SiteId, Option<T>>) -> Arbitration<'_, T> {
    let sentinel = absent_timestamp();
    let effective = |candidate: &Option<T>| {
        candidate
            .as_ref()
            .map(|e| e.timestamp())
            .unwrap_or(sentinel)
    };

    let mut best: Option<(&SiteId, &Option<T>)> = None;
    for (site, candidate) in candidates {
        let newer = match best {
            Some((_, current)) => effective(candidate) > effective(current),
            None => true,
        };
        if newer {
            best = Some((site, candidate));
        }
    }

    match best {
        None | Some((_, None)) => Arbitration::NotFound,
        Some((site, Some(event))) if event.comment() == SYNC_COMMENT => {
            Arbitration::AlreadySynchronized { site: site.clone() }
        }
        Some((site, Some(event))) => Arbitration::Source {
            site: site.clone(),
            event,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
