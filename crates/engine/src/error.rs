use thiserror::Error;

use crate::assistant::AssistantApiError;

/// Failures of a single chat turn.
///
/// `Display` carries the full detail and is only ever logged. What a widget
/// gets to see is [`ChatError::public_message`].
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no assistant API key is configured")]
    MissingApiKey,

    #[error("request did not name an assistant")]
    MissingAssistantId,

    #[error("request carried no message")]
    MissingMessage,

    #[error("unreadable chat request: {detail}")]
    MalformedRequest { detail: String },

    #[error("assistant '{assistant_id}' was not found: {source}")]
    InvalidAssistant {
        assistant_id: String,
        #[source]
        source: AssistantApiError,
    },

    #[error("run {run_id} failed: {detail}")]
    RunFailed { run_id: String, detail: String },

    #[error("run {run_id} did not finish (last status: {status})")]
    Timeout { run_id: String, status: String },

    #[error("assistant bridge failed: {0}")]
    Bridge(#[from] AssistantApiError),

    #[error("run completed but thread {thread_id} holds no assistant reply")]
    MissingReply { thread_id: String },
}

impl ChatError {
    pub fn public_message(&self) -> &'static str {
        match self {
            ChatError::MissingApiKey => {
                "OpenAI API key not configured. Please contact the administrator."
            }
            ChatError::MissingAssistantId => "Assistant ID is required.",
            ChatError::MissingMessage => "Message is required.",
            ChatError::MalformedRequest { .. } => "Invalid request body.",
            ChatError::InvalidAssistant { .. } => {
                "Invalid Assistant ID. Please check your configuration."
            }
            ChatError::RunFailed { .. } => "Assistant failed to process the message",
            ChatError::Timeout { .. } => "Request timed out. Please try again.",
            ChatError::Bridge(_) | ChatError::MissingReply { .. } => {
                "Failed to process chat message"
            }
        }
    }

    /// True for failures caused by the caller's input or server setup rather
    /// than by the assistant service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ChatError::MissingApiKey
                | ChatError::MissingAssistantId
                | ChatError::MissingMessage
                | ChatError::MalformedRequest { .. }
                | ChatError::InvalidAssistant { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no bearer token supplied")]
    MissingToken,

    #[error("token rejected: {0}")]
    InvalidToken(&'static str),

    #[error("password did not match")]
    InvalidPassword,

    #[error("auth backend failure: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Access token required",
            AuthError::InvalidToken(_) => "Invalid token",
            AuthError::InvalidPassword => "Invalid password",
            AuthError::Internal(_) => "Server error",
        }
    }
}
