//! Error types for mirrorbot-engine.

use thiserror::Error;

use mirrorbot_core::error::ClientError;

/// Errors raised while processing a single title. All of these are caught
/// at the title boundary by the orchestrator and downgraded to logged
/// outcomes; none aborts a batch.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A client call failed (transport, auth, or protocol).
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The site posed a challenge the solver does not recognize.
    #[error("unsolvable edit challenge: {question}")]
    UnsolvableChallenge { question: String },

    /// The site rejected the edit and posed no challenge.
    #[error("edit rejected: {detail}")]
    EditRejected { detail: String },

    /// The resubmission with a solved challenge answer was rejected too.
    /// There is no further retry.
    #[error("edit rejected after challenge answer: {detail}")]
    ChallengeRejected { detail: String },

    /// The authoritative upload entry's file could not be fetched.
    #[error("source file unavailable: {detail}")]
    SourceFileUnavailable { detail: String },
}
