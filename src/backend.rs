//! HTTP client for the RAG backend.
//!
//! The session controller only depends on the [`ChatBackend`] trait; the
//! concrete [`HttpBackend`] also wraps the backend's sibling endpoints
//! (client registration, document upload, admin listing/deletion) used by the
//! CLI subcommands.  Those never touch the session controller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// One chat turn as sent to the inference endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnRequest {
    pub question: String,
    pub provider: String,
    /// Present only when the provider requires one.
    pub credential: Option<String>,
}

/// Successful inference result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
}

/// How a backend call can fail.  None of these are fatal to the session —
/// the dispatcher turns them into a transcript entry and carries on.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("could not reach the backend: {0}")]
    Connect(String),
    #[error("the request timed out")]
    Timeout,
    #[error("server error ({code}): {detail}")]
    Status { code: u16, detail: String },
    #[error("malformed response from the backend")]
    MalformedResponse,
}

/// The inference endpoint, as the session controller sees it.
#[async_trait]
pub trait ChatBackend {
    async fn chat(&self, request: &ChatTurnRequest) -> Result<ChatReply, BackendError>;
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatPayload<'a> {
    question: &'a str,
    model_provider: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    response: String,
}

#[derive(Deserialize)]
pub struct RegisteredClient {
    pub client_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ClientStats {
    #[serde(default)]
    pub documents_count: u64,
    #[serde(default)]
    pub chunks_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ClientSummary {
    pub client_id: String,
    pub stats: Option<ClientStats>,
}

#[derive(Debug, Deserialize)]
pub struct UploadOutcome {
    pub message: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// A document handed to [`HttpBackend::upload_documents`]: file name plus
/// raw bytes.  Reading from disk is the caller's concern.
pub struct DocumentFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

// ── HTTP implementation ─────────────────────────────────────────────────────

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpBackend {
    client: reqwest::Client,
    api_url: Url,
}

impl HttpBackend {
    pub fn new(api_url: &str) -> anyhow::Result<Self> {
        let api_url = Url::parse(api_url.trim_end_matches('/'))
            .map_err(|e| anyhow::anyhow!("invalid backend URL {api_url}: {e}"))?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ragchat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, api_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.api_url
            .join(path)
            .map_err(|e| BackendError::Connect(e.to_string()))
    }

    /// Register a new client and return its id.
    pub async fn register_client(&self) -> Result<RegisteredClient, BackendError> {
        let url = self.endpoint("/api/clients/register")?;
        let res = self
            .client
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(map_send_error)?;
        let res = check_status(res).await?;
        res.json().await.map_err(|_| BackendError::MalformedResponse)
    }

    /// List all registered clients (admin endpoint).
    pub async fn list_clients(&self) -> Result<Vec<ClientSummary>, BackendError> {
        let url = self.endpoint("/api/admin/clients")?;
        let res = self.client.get(url).send().await.map_err(map_send_error)?;
        let res = check_status(res).await?;
        res.json().await.map_err(|_| BackendError::MalformedResponse)
    }

    /// Delete a client and its documents (admin endpoint).
    pub async fn delete_client(&self, client_id: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("/api/admin/clients/{client_id}"))?;
        let res = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(map_send_error)?;
        check_status(res).await?;
        Ok(())
    }

    /// Upload PDF documents and/or URLs into a client's knowledge base.
    pub async fn upload_documents(
        &self,
        client_id: &str,
        files: Vec<DocumentFile>,
        urls: &[String],
    ) -> Result<UploadOutcome, BackendError> {
        let url = self.endpoint(&format!("/api/clients/{client_id}/documents/upload"))?;

        let mut form = reqwest::multipart::Form::new();
        for file in files {
            let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.name);
            form = form.part("files", part);
        }
        let urls_json =
            serde_json::to_string(urls).map_err(|e| BackendError::Connect(e.to_string()))?;
        form = form.text("urls", urls_json);

        let res = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;
        let res = check_status(res).await?;
        res.json().await.map_err(|_| BackendError::MalformedResponse)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat(&self, request: &ChatTurnRequest) -> Result<ChatReply, BackendError> {
        let url = self.endpoint("/api/chat")?;
        debug!(provider = %request.provider, "dispatching chat turn");

        let payload = ChatPayload {
            question: &request.question,
            model_provider: &request.provider,
            api_key: request.credential.as_deref(),
        };

        let res = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(map_send_error)?;
        let res = check_status(res).await?;
        let body: ChatResponseBody =
            res.json().await.map_err(|_| BackendError::MalformedResponse)?;
        Ok(ChatReply {
            text: body.response,
        })
    }
}

fn map_send_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Connect(err.to_string())
    }
}

/// Turn a non-success status into [`BackendError::Status`], extracting the
/// backend's JSON `detail` field when present.
async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let code = status.as_u16();
    let detail = match res.text().await {
        Ok(body) => serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    body
                }
            }),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    Err(BackendError::Status { code, detail })
}
