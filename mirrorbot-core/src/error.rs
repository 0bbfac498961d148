//! Error types for mirrorbot-core.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems. Raised before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("cannot read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error on load, with the offending file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Synchronization needs at least two configured sites.
    #[error("configuration lists {found} site(s); at least two are required")]
    TooFewSites { found: usize },

    /// A site entry is missing a required field.
    #[error("invalid site '{key}': {reason}")]
    InvalidSite { key: String, reason: String },

    /// An explicit page list was given but contains no usable titles.
    #[error("page list is present but empty")]
    EmptyPageList,
}

/// Errors surfaced by a [`crate::client::WikiClient`] implementation.
///
/// Everything here is non-fatal to a batch: the orchestrator downgrades
/// client errors to per-(title, site) failures.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The site could not be reached, or answered with an HTTP error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The site rejected the bot credentials.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The site answered, but not with the JSON shape the action API
    /// promises.
    #[error("unexpected API response: {0}")]
    Protocol(String),
}
