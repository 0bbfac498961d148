//! # mirrorbot-client
//!
//! Blocking HTTP implementation of the [`WikiClient`] contract over the
//! MediaWiki action API (ureq).
//!
//! One [`MediaWikiClient`] serves one site. Anonymous reads share a plain
//! agent; each [`login`](WikiClient::login) builds a fresh cookie-holding
//! agent whose cookies *are* the session, wrapped in an [`HttpSession`]
//! value the engine threads through authenticated calls.

mod multipart;
mod parse;

use std::io::Read;

use chrono::NaiveDate;
use serde_json::Value;

use mirrorbot_core::client::{CaptchaAnswer, EditOutcome, WikiClient};
use mirrorbot_core::error::ClientError;
use mirrorbot_core::types::{ChangeEntry, Revision, UploadEntry, WikiSite};

use crate::multipart::MultipartBody;

/// Feed page-size limit; the API caps bot reads here and nothing paginates
/// past it.
const FEED_LIMIT: &str = "500";

/// An authenticated session: a cookie-holding agent produced by a
/// successful login. Opaque outside this crate.
pub struct HttpSession {
    agent: ureq::Agent,
}

/// Action-API client for one wiki site.
pub struct MediaWikiClient {
    site: WikiSite,
    agent: ureq::Agent,
}

impl MediaWikiClient {
    pub fn new(site: WikiSite) -> Self {
        Self {
            site,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    fn get_json(&self, agent: &ureq::Agent, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        let mut request = agent.get(&self.site.base_url);
        for (key, value) in params {
            request = request.query(key, value);
        }
        request
            .call()
            .map_err(http_err)?
            .into_json()
            .map_err(body_err)
    }

    fn post_form(
        &self,
        agent: &ureq::Agent,
        params: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        agent
            .post(&self.site.base_url)
            .send_form(params)
            .map_err(http_err)?
            .into_json()
            .map_err(body_err)
    }

    fn csrf_token(&self, session: &HttpSession) -> Result<String, ClientError> {
        let body = self.get_json(
            &session.agent,
            &[("action", "query"), ("meta", "tokens"), ("format", "json")],
        )?;
        parse::csrf_token(&body).map(str::to_owned)
    }
}

impl WikiClient for MediaWikiClient {
    type Session = HttpSession;

    fn login(&self) -> Result<HttpSession, ClientError> {
        let agent = ureq::AgentBuilder::new().build();
        let body = self.get_json(
            &agent,
            &[
                ("action", "query"),
                ("meta", "tokens"),
                ("type", "login"),
                ("format", "json"),
            ],
        )?;
        let token = parse::login_token(&body)?.to_owned();

        let body = self.post_form(
            &agent,
            &[
                ("action", "login"),
                ("lgname", &self.site.credentials.bot_name),
                ("lgpassword", &self.site.credentials.bot_password),
                ("lgtoken", &token),
                ("format", "json"),
            ],
        )?;
        parse::ensure_login_success(&body)?;
        tracing::debug!("{}: logged in as {}", self.site.id, self.site.credentials.bot_name);
        Ok(HttpSession { agent })
    }

    fn logout(&self, session: HttpSession) -> Result<(), ClientError> {
        let token = self.csrf_token(&session)?;
        self.post_form(
            &session.agent,
            &[("action", "logout"), ("token", &token), ("format", "json")],
        )?;
        Ok(())
    }

    fn recent_changes(&self, date: NaiveDate) -> Result<Vec<ChangeEntry>, ClientError> {
        // Newest-first window over the whole day; start > end per the
        // API's descending-order convention.
        let body = self.get_json(
            &self.agent,
            &[
                ("action", "query"),
                ("format", "json"),
                ("list", "recentchanges"),
                ("rcstart", &format!("{date}T23:59:00Z")),
                ("rcend", &format!("{date}T00:00:00Z")),
                ("rcprop", "title|timestamp|user|comment"),
                ("rctype", "edit|new"),
                ("rclimit", FEED_LIMIT),
            ],
        )?;
        parse::recent_changes(&body)
    }

    fn recent_uploads(&self, date: NaiveDate) -> Result<Vec<UploadEntry>, ClientError> {
        let body = self.get_json(
            &self.agent,
            &[
                ("action", "query"),
                ("format", "json"),
                ("list", "allimages"),
                ("aistart", &format!("{date}T23:59:00Z")),
                ("aiend", &format!("{date}T00:00:00Z")),
                ("aiprop", "title|timestamp|user|comment|url"),
                ("ailimit", FEED_LIMIT),
                ("aidir", "descending"),
                ("aisort", "timestamp"),
            ],
        )?;
        parse::recent_uploads(&body)
    }

    fn fetch_revision(&self, title: &str) -> Result<Option<Revision>, ClientError> {
        let body = self.get_json(
            &self.agent,
            &[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "revisions"),
                ("rvprop", "content|timestamp|user|comment"),
            ],
        )?;
        parse::revision(&self.site.id, title, &body)
    }

    fn post_edit(
        &self,
        session: &HttpSession,
        title: &str,
        text: &str,
        comment: &str,
        captcha: Option<&CaptchaAnswer>,
    ) -> Result<EditOutcome, ClientError> {
        let token = self.csrf_token(session)?;
        let mut params = vec![
            ("action", "edit".to_owned()),
            ("title", title.to_owned()),
            ("token", token),
            ("format", "json".to_owned()),
            ("text", text.to_owned()),
            ("summary", comment.to_owned()),
            ("bot", "1".to_owned()),
        ];
        if let Some(answer) = captcha {
            params.push(("captchaid", answer.id.clone()));
            params.push(("captchaword", answer.answer.to_string()));
        }
        let borrowed: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let body = self.post_form(&session.agent, &borrowed)?;
        Ok(parse::edit_outcome("edit", &body))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.agent.get(url).call().map_err(http_err)?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(body_err)?;
        Ok(bytes)
    }

    fn upload_file(
        &self,
        session: &HttpSession,
        title: &str,
        bytes: &[u8],
        comment: &str,
    ) -> Result<EditOutcome, ClientError> {
        let token = self.csrf_token(session)?;
        let mut body = MultipartBody::new();
        body.text("action", "upload");
        body.text("filename", title);
        body.text("token", &token);
        body.text("format", "json");
        body.text("ignorewarnings", "1");
        body.text("comment", comment);
        body.file("file", title, bytes);
        let (content_type, payload) = body.finish();

        let response = session
            .agent
            .post(&self.site.base_url)
            .set("Content-Type", &content_type)
            .send_bytes(&payload)
            .map_err(http_err)?;
        let body: Value = response.into_json().map_err(body_err)?;
        Ok(parse::edit_outcome("upload", &body))
    }
}

fn http_err(e: ureq::Error) -> ClientError {
    match e {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            ClientError::Transport(format!("HTTP {code}: {body}"))
        }
        ureq::Error::Transport(transport) => ClientError::Transport(transport.to_string()),
    }
}

fn body_err(e: std::io::Error) -> ClientError {
    ClientError::Protocol(format!("unreadable response body: {e}"))
}
