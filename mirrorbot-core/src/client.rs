//! The per-site client capability the engine is written against.
//!
//! Implementations own transport, token handling, and the MediaWiki action
//! API encoding; the engine only sees this trait. Sessions are explicit
//! values threaded through authenticated calls — a client never caches one
//! internally.

use chrono::NaiveDate;

use crate::error::ClientError;
use crate::types::{ChangeEntry, Revision, UploadEntry};

/// An anti-spam challenge returned by a rejected edit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaChallenge {
    pub id: String,
    /// Arithmetic question of the form `<int><op><int>`.
    pub question: String,
}

/// A solved challenge attached to a resubmitted edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaAnswer {
    pub id: String,
    pub answer: i64,
}

/// Result of one edit or upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub success: bool,
    /// Present when the site demands a challenge answer before accepting.
    pub captcha: Option<CaptchaChallenge>,
    /// Raw failure detail for logging, when the site reported one.
    pub detail: Option<String>,
}

impl EditOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            captcha: None,
            detail: None,
        }
    }
}

/// Read and write operations against a single wiki site.
pub trait WikiClient {
    /// Authenticated session handle. Opaque to the engine.
    type Session;

    /// Acquire a session using the site's bot credentials.
    fn login(&self) -> Result<Self::Session, ClientError>;

    /// Release a session. Consumes it so a logged-out session cannot be
    /// reused.
    fn logout(&self, session: Self::Session) -> Result<(), ClientError>;

    /// Edits and page creations on `date`, newest first, bounded by the
    /// site's feed limit (500 entries, no pagination).
    fn recent_changes(&self, date: NaiveDate) -> Result<Vec<ChangeEntry>, ClientError>;

    /// File uploads on `date`, same shape and bounds as [`Self::recent_changes`].
    fn recent_uploads(&self, date: NaiveDate) -> Result<Vec<UploadEntry>, ClientError>;

    /// Current revision of `title`, or `None` when the site has no such
    /// page.
    fn fetch_revision(&self, title: &str) -> Result<Option<Revision>, ClientError>;

    /// Replace the content of `title`. `captcha` carries the solved answer
    /// on the single permitted resubmission.
    fn post_edit(
        &self,
        session: &Self::Session,
        title: &str,
        text: &str,
        comment: &str,
        captcha: Option<&CaptchaAnswer>,
    ) -> Result<EditOutcome, ClientError>;

    /// Fetch raw file bytes from a URL previously returned by
    /// [`Self::recent_uploads`].
    fn download(&self, url: &str) -> Result<Vec<u8>, ClientError>;

    /// Upload a file under `title`, overwriting any existing version.
    fn upload_file(
        &self,
        session: &Self::Session,
        title: &str,
        bytes: &[u8],
        comment: &str,
    ) -> Result<EditOutcome, ClientError>;
}
