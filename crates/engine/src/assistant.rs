//! Client for the hosted assistant service (threads, messages and runs).
//!
//! [`AssistantApi`] is the seam the conversation bridge talks through;
//! [`OpenAiAssistants`] is the reqwest-backed implementation.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantApiError {
    #[error("assistant service returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("could not reach assistant service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response from assistant service: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AssistantApiError {
    /// Whether the service rejected the assistant id itself.
    pub fn is_assistant_not_found(&self) -> bool {
        match self {
            AssistantApiError::Status { message, .. } => {
                message.to_ascii_lowercase().contains("no assistant found")
            }
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, AssistantApiError>;

#[derive(Deserialize, Debug, Clone)]
pub struct Thread {
    pub id: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    /// Anything else the service reports (`requires_action`, `expired`, ...).
    Other(String),
}

impl From<String> for RunStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            _ => RunStatus::Other(status),
        }
    }
}

impl RunStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Other(s) => s,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    pub fn failure_detail(&self) -> String {
        match &self.last_error {
            Some(e) if !e.code.is_empty() => format!("{}: {}", e.code, e.message),
            Some(e) => e.message.clone(),
            None => "no error detail reported".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TextValue {
    pub value: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ThreadMessage {
    #[serde(default)]
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// First text block of the message, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }
}

#[derive(Deserialize, Debug)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

/// Thread/run operations of the hosted assistant service.
pub trait AssistantApi: Send + Sync {
    fn retrieve_thread(&self, thread_id: &str) -> impl Future<Output = ApiResult<Thread>> + Send;

    fn create_thread(&self) -> impl Future<Output = ApiResult<Thread>> + Send;

    fn create_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> impl Future<Output = ApiResult<Run>> + Send;

    fn retrieve_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> impl Future<Output = ApiResult<Run>> + Send;

    /// Most recent messages first.
    fn list_messages(
        &self,
        thread_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<ThreadMessage>>> + Send;
}

/// Builds an [`AssistantApi`] bound to one credential.
pub trait AssistantConnector: Send + Sync {
    type Api: AssistantApi;

    fn connect(&self, api_key: &str) -> Self::Api;
}

#[derive(Clone, Debug)]
pub struct OpenAiConnector {
    http: Client,
    base_url: String,
}

impl OpenAiConnector {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl AssistantConnector for OpenAiConnector {
    type Api = OpenAiAssistants;

    fn connect(&self, api_key: &str) -> OpenAiAssistants {
        OpenAiAssistants {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
        }
    }
}

pub struct OpenAiAssistants {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct NewMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct NewRun<'a> {
    assistant_id: &'a str,
}

#[derive(Deserialize)]
struct ServiceErrorBody {
    error: ServiceError,
}

#[derive(Deserialize)]
struct ServiceError {
    message: String,
}

impl OpenAiAssistants {
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ServiceErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(AssistantApiError::Status { status, message });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl AssistantApi for OpenAiAssistants {
    async fn retrieve_thread(&self, thread_id: &str) -> ApiResult<Thread> {
        self.send(self.request(Method::GET, &format!("/threads/{thread_id}")))
            .await
    }

    async fn create_thread(&self) -> ApiResult<Thread> {
        self.send(self.request(Method::POST, "/threads").json(&json!({})))
            .await
    }

    async fn create_message(&self, thread_id: &str, content: &str) -> ApiResult<()> {
        let body = NewMessage {
            role: "user",
            content,
        };
        self.send::<serde_json::Value>(
            self.request(Method::POST, &format!("/threads/{thread_id}/messages"))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> ApiResult<Run> {
        self.send(
            self.request(Method::POST, &format!("/threads/{thread_id}/runs"))
                .json(&NewRun { assistant_id }),
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> ApiResult<Run> {
        self.send(self.request(Method::GET, &format!("/threads/{thread_id}/runs/{run_id}")))
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> ApiResult<Vec<ThreadMessage>> {
        let list: MessageList = self
            .send(
                self.request(Method::GET, &format!("/threads/{thread_id}/messages"))
                    .query(&[("order", "desc"), ("limit", "20")]),
            )
            .await?;
        Ok(list.data)
    }
}
