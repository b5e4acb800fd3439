//! Maimemo open API client.
//!
//! Three endpoints are used: list notepads, get one notepad, and overwrite a
//! notepad. The update endpoint has no partial semantics, so callers resubmit
//! the whole record.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Api;
use crate::error::{NotepadError, NotepadResult};
use crate::model::{
    DetailEnvelope, ListEnvelope, Notepad, NotepadSummary, NotepadUpdate, UpdateEnvelope,
};

#[async_trait]
pub trait NotepadApi: Send + Sync {
    /// Lists the first `limit` notepads, offset 0.
    async fn list_notepads(&self, token: &str, limit: u32) -> NotepadResult<Vec<NotepadSummary>>;

    async fn get_notepad(&self, id: &str, token: &str) -> NotepadResult<Notepad>;

    /// Overwrites the notepad and returns the parsed response body.
    async fn update_notepad(
        &self,
        id: &str,
        update: &NotepadUpdate,
        token: &str,
    ) -> NotepadResult<Value>;
}

/// Resolves a notepad title to its id. Only the first page is searched and the
/// title comparison is exact.
pub async fn find_notepad_id<A: NotepadApi + ?Sized>(
    api: &A,
    token: &str,
    title: &str,
    limit: u32,
) -> NotepadResult<String> {
    let notepads = api.list_notepads(token, limit).await?;
    notepads
        .into_iter()
        .find(|np| np.title == title)
        .map(|np| np.id)
        .ok_or_else(|| NotepadError::NotepadNotFound(title.to_string()))
}

pub struct MaimemoClient {
    http: Client,
    base_url: String,
}

impl MaimemoClient {
    pub fn new(cfg: &Api) -> NotepadResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("potmemo/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn notepad_url(&self, id: &str) -> String {
        format!("{}/notepads/{}", self.base_url, urlencoding::encode(id))
    }

    fn list_url(&self, limit: u32) -> String {
        format!("{}/notepads?limit={}&offset=0", self.base_url, limit)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        action: &'static str,
    ) -> NotepadResult<T> {
        tracing::debug!(%url, action, "GET");
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NotepadError::RequestFailed {
                action,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_body(&body, action)
    }
}

#[async_trait]
impl NotepadApi for MaimemoClient {
    async fn list_notepads(&self, token: &str, limit: u32) -> NotepadResult<Vec<NotepadSummary>> {
        let envelope: ListEnvelope = self.get_json(&self.list_url(limit), token, "list notepads").await?;
        Ok(envelope.data.notepads)
    }

    async fn get_notepad(&self, id: &str, token: &str) -> NotepadResult<Notepad> {
        let envelope: DetailEnvelope = self
            .get_json(&self.notepad_url(id), token, "get notepad")
            .await?;
        envelope
            .data
            .and_then(|d| d.notepad)
            .ok_or(NotepadError::InvalidDetailResponse)
    }

    async fn update_notepad(
        &self,
        id: &str,
        update: &NotepadUpdate,
        token: &str,
    ) -> NotepadResult<Value> {
        let url = self.notepad_url(id);
        tracing::debug!(%url, "POST");
        let response = self
            .http
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .json(&UpdateEnvelope { notepad: update })
            .send()
            .await?;

        let status = response.status();
        if !is_update_success(status) {
            return Err(NotepadError::UpdateFailed {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        parse_body(&body, "update notepad")
    }
}

fn is_update_success(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

fn parse_body<T: DeserializeOwned>(body: &str, action: &'static str) -> NotepadResult<T> {
    if body.trim().is_empty() {
        return Err(NotepadError::malformed(action, "empty body"));
    }
    serde_json::from_str(body).map_err(|e| NotepadError::malformed(action, e))
}
