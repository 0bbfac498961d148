//! # mirrorbot-engine
//!
//! The multi-site reconciliation core: change discovery across per-site
//! feeds, revision arbitration with loop avoidance, content transforms that
//! keep markup position-safe, and the propagation orchestrator.
//!
//! Everything here is written against the [`mirrorbot_core::client::WikiClient`]
//! contract; no HTTP happens in this crate.

pub mod arbiter;
pub mod challenge;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod session;
pub mod transform;

pub use error::SyncError;
pub use orchestrator::{Orchestrator, SiteHandle, TitleReport, TitleStatus};
