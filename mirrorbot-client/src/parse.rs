//! Action-API response decoding.
//!
//! The API speaks loosely-shaped JSON (pages keyed by page id, legacy `*`
//! content key), so decoding navigates `serde_json::Value` and maps every
//! missing piece to [`ClientError::Protocol`].

use chrono::{DateTime, Utc};
use serde_json::Value;

use mirrorbot_core::client::{CaptchaChallenge, EditOutcome};
use mirrorbot_core::error::ClientError;
use mirrorbot_core::types::{ChangeEntry, Revision, SiteId, UploadEntry};

fn missing(what: &str) -> ClientError {
    ClientError::Protocol(format!("missing {what}"))
}

fn str_field<'a>(value: &'a Value, field: &str) -> Result<&'a str, ClientError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(field))
}

pub(crate) fn timestamp(raw: &str) -> Result<DateTime<Utc>, ClientError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ClientError::Protocol(format!("bad timestamp '{raw}': {e}")))
}

pub(crate) fn login_token(body: &Value) -> Result<&str, ClientError> {
    body.pointer("/query/tokens/logintoken")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("query.tokens.logintoken"))
}

pub(crate) fn csrf_token(body: &Value) -> Result<&str, ClientError> {
    body.pointer("/query/tokens/csrftoken")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("query.tokens.csrftoken"))
}

/// Reject failed logins. Successful responses carry
/// `{"login": {"result": "Success"}}`.
pub(crate) fn ensure_login_success(body: &Value) -> Result<(), ClientError> {
    match body.pointer("/login/result").and_then(Value::as_str) {
        Some("Success") => Ok(()),
        Some(other) => Err(ClientError::Auth(format!("login result '{other}'"))),
        None => Err(ClientError::Auth("no login result in response".to_owned())),
    }
}

/// Decode a `prop=revisions` query for one title. `None` when the site has
/// no such page.
pub(crate) fn revision(site: &SiteId, title: &str, body: &Value) -> Result<Option<Revision>, ClientError> {
    let pages = body
        .pointer("/query/pages")
        .and_then(Value::as_object)
        .ok_or_else(|| missing("query.pages"))?;
    let page = pages.values().next().ok_or_else(|| missing("page entry"))?;
    if page.get("missing").is_some() || page.get("invalid").is_some() {
        return Ok(None);
    }

    let revision = page
        .pointer("/revisions/0")
        .ok_or_else(|| missing("revisions[0]"))?;
    Ok(Some(Revision {
        site: site.clone(),
        title: page
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(title)
            .to_owned(),
        timestamp: timestamp(str_field(revision, "timestamp")?)?,
        // user/comment can be revision-deleted; absent means hidden.
        author: revision
            .get("user")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        comment: revision
            .get("comment")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        content: str_field(revision, "*")?.to_owned(),
    }))
}

pub(crate) fn recent_changes(body: &Value) -> Result<Vec<ChangeEntry>, ClientError> {
    let entries = body
        .pointer("/query/recentchanges")
        .and_then(Value::as_array)
        .ok_or_else(|| missing("query.recentchanges"))?;
    entries
        .iter()
        .map(|entry| {
            Ok(ChangeEntry {
                title: str_field(entry, "title")?.to_owned(),
                timestamp: timestamp(str_field(entry, "timestamp")?)?,
                user: entry
                    .get("user")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                comment: entry
                    .get("comment")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            })
        })
        .collect()
}

pub(crate) fn recent_uploads(body: &Value) -> Result<Vec<UploadEntry>, ClientError> {
    let entries = body
        .pointer("/query/allimages")
        .and_then(Value::as_array)
        .ok_or_else(|| missing("query.allimages"))?;
    entries
        .iter()
        .map(|entry| {
            Ok(UploadEntry {
                title: str_field(entry, "title")?.to_owned(),
                timestamp: timestamp(str_field(entry, "timestamp")?)?,
                user: entry
                    .get("user")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                comment: entry
                    .get("comment")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
                url: str_field(entry, "url")?.to_owned(),
            })
        })
        .collect()
}

/// Decode an `action=edit` or `action=upload` response body.
///
/// Success is `{"<action>": {"result": "Success"}}`; a challenge demand
/// arrives as `{"edit": {"result": "Failure", "captcha": {...}}}`; anything
/// else is a failure whose body becomes the logged detail.
pub(crate) fn edit_outcome(action: &str, body: &Value) -> EditOutcome {
    if body
        .pointer(&format!("/{action}/result"))
        .and_then(Value::as_str)
        == Some("Success")
    {
        return EditOutcome::success();
    }

    let captcha = body.pointer(&format!("/{action}/captcha")).and_then(|c| {
        Some(CaptchaChallenge {
            id: c.get("id")?.as_str()?.to_owned(),
            question: c.get("question")?.as_str()?.to_owned(),
        })
    });
    EditOutcome {
        success: false,
        captcha,
        detail: Some(body.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
