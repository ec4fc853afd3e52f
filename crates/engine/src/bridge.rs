//! Turns one widget message into a full thread/run exchange with the
//! assistant service and hands back the reply.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::assistant::{
    AssistantApi, AssistantApiError, AssistantConnector, Run, RunStatus, Thread, ThreadMessage,
};
use crate::config::ConfigStore;
use crate::error::ChatError;

/// How long to wait on a run before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 30,
        }
    }
}

/// Suspends the polling task between run status checks.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub message: String,
    pub thread_id: Option<String>,
    pub assistant_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub reply: String,
    pub thread_id: String,
}

pub struct ConversationBridge<C, S = TokioSleeper> {
    connector: C,
    config: Arc<ConfigStore>,
    poll: PollPolicy,
    sleeper: S,
}

impl<C: AssistantConnector> ConversationBridge<C, TokioSleeper> {
    pub fn new(connector: C, config: Arc<ConfigStore>, poll: PollPolicy) -> Self {
        Self::with_sleeper(connector, config, poll, TokioSleeper)
    }
}

impl<C: AssistantConnector, S: Sleeper> ConversationBridge<C, S> {
    pub fn with_sleeper(connector: C, config: Arc<ConfigStore>, poll: PollPolicy, sleeper: S) -> Self {
        Self {
            connector,
            config,
            poll,
            sleeper,
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    pub async fn handle(&self, turn: ChatTurn) -> Result<ChatReply, ChatError> {
        let api_key = self.config.api_key().await.ok_or(ChatError::MissingApiKey)?;

        let assistant_id = turn.assistant_id.trim();
        if assistant_id.is_empty() {
            return Err(ChatError::MissingAssistantId);
        }
        if turn.message.trim().is_empty() {
            return Err(ChatError::MissingMessage);
        }

        let api = self.connector.connect(&api_key);

        self.exchange(&api, &turn.message, turn.thread_id.as_deref(), assistant_id)
            .await
            .map_err(|e| match e {
                ChatError::Bridge(source) if source.is_assistant_not_found() => {
                    ChatError::InvalidAssistant {
                        assistant_id: assistant_id.to_string(),
                        source,
                    }
                }
                other => other,
            })
    }

    async fn exchange<A: AssistantApi>(
        &self,
        api: &A,
        message: &str,
        thread_id: Option<&str>,
        assistant_id: &str,
    ) -> Result<ChatReply, ChatError> {
        let thread = resolve_thread(api, thread_id).await?;

        api.create_message(&thread.id, message).await?;

        let run = api.create_run(&thread.id, assistant_id).await?;
        tracing::debug!(thread_id = %thread.id, run_id = %run.id, %assistant_id, "Run started");

        let run = self.wait_for_run(api, &thread.id, &run.id).await?;

        match run.status {
            RunStatus::Completed => {
                let messages = api.list_messages(&thread.id).await?;
                // Newest first; only the latest assistant entry answers this turn.
                let reply = messages
                    .iter()
                    .find(|m| m.role == "assistant")
                    .and_then(ThreadMessage::text)
                    .ok_or_else(|| ChatError::MissingReply {
                        thread_id: thread.id.clone(),
                    })?;

                Ok(ChatReply {
                    reply: reply.to_string(),
                    thread_id: thread.id,
                })
            }
            RunStatus::Failed => Err(ChatError::RunFailed {
                detail: run.failure_detail(),
                run_id: run.id,
            }),
            status => Err(ChatError::Timeout {
                run_id: run.id,
                status: status.as_str().to_string(),
            }),
        }
    }

    /// Re-read the run until it leaves queued/in progress or the attempt
    /// budget is spent. Returns the last observed run either way.
    async fn wait_for_run<A: AssistantApi>(
        &self,
        api: &A,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, AssistantApiError> {
        let mut run = api.retrieve_run(thread_id, run_id).await?;
        let mut attempts = 0;

        while run.status.is_pending() && attempts < self.poll.max_attempts {
            self.sleeper.sleep(self.poll.interval).await;
            run = api.retrieve_run(thread_id, run_id).await?;
            attempts += 1;
        }

        tracing::debug!(%thread_id, %run_id, status = run.status.as_str(), attempts, "Run settled");
        Ok(run)
    }
}

/// Fetch the caller's thread, or start a new one if there is none or it can
/// no longer be fetched.
async fn resolve_thread<A: AssistantApi>(api: &A, thread_id: Option<&str>) -> Result<Thread, AssistantApiError> {
    if let Some(id) = thread_id.filter(|id| !id.trim().is_empty()) {
        match api.retrieve_thread(id).await {
            Ok(thread) => return Ok(thread),
            Err(e) => {
                tracing::warn!(stale_thread_id = %id, error = %e, "Thread unavailable, starting a new one");
            }
        }
    }
    api.create_thread().await
}
