//! # mirrorbot-core
//!
//! Domain types, configuration, and the per-site client contract shared by
//! the reconciliation engine and its HTTP implementation.

pub mod client;
pub mod config;
pub mod error;
pub mod types;
