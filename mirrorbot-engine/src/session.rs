//! Scoped session acquisition — every site logs in before a batch and is
//! guaranteed a logout on every exit path, including early returns and
//! panics unwinding out of title processing.

use std::collections::BTreeMap;

use mirrorbot_core::client::WikiClient;
use mirrorbot_core::types::SiteId;

use crate::orchestrator::SiteHandle;

/// Holds one open session per successfully logged-in site and releases all
/// of them on drop.
///
/// A site whose login fails is logged and simply has no session; writes to
/// it fail individually while the rest of the batch proceeds.
pub struct SessionPool<'a, C: WikiClient> {
    sites: &'a BTreeMap<SiteId, SiteHandle<C>>,
    sessions: BTreeMap<SiteId, C::Session>,
}

impl<'a, C: WikiClient> SessionPool<'a, C> {
    /// Log in to every site in the registry.
    pub fn open(sites: &'a BTreeMap<SiteId, SiteHandle<C>>) -> Self {
        let mut sessions = BTreeMap::new();
        for (id, handle) in sites {
            match handle.client.login() {
                Ok(session) => {
                    tracing::debug!("{id}: session opened");
                    sessions.insert(id.clone(), session);
                }
                Err(e) => tracing::error!("{id}: login failed: {e}"),
            }
        }
        Self { sites, sessions }
    }

    /// The open session for `site`, if its login succeeded.
    pub fn session(&self, site: &SiteId) -> Option<&C::Session> {
        self.sessions.get(site)
    }
}

impl<C: WikiClient> Drop for SessionPool<'_, C> {
    fn drop(&mut self) {
        for (id, session) in std::mem::take(&mut self.sessions) {
            match self.sites.get(&id) {
                Some(handle) => {
                    if let Err(e) = handle.client.logout(session) {
                        tracing::warn!("{id}: logout failed: {e}");
                    }
                }
                None => tracing::warn!("{id}: session has no matching site handle"),
            }
        }
    }
}
