use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::{
    config::OpenAiConfig,
    error::{AssistantError, Result},
    run::{DEFAULT_POLL_INTERVAL, DEFAULT_RUN_TIMEOUT, Run, wait_for_run},
};

/// A hosted agent that keeps conversation state per thread.
#[async_trait]
pub trait ConversationAgent: Send + Sync {
    /// Open a new conversation and return its thread id.
    async fn start_thread(&self) -> Result<String>;

    /// Post `content` to the thread, run the assistant and return its reply.
    async fn reply(&self, thread_id: &str, content: &str) -> Result<String>;
}

pub(crate) fn authorized_client(config: &OpenAiConfig, beta: bool) -> Result<Client> {
    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .map_err(|e| AssistantError::Config(format!("invalid API key header: {e}")))?;
    headers.insert(AUTHORIZATION, bearer);
    if beta {
        headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v2"));
    }

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .build()?)
}

pub(crate) async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let res = req.send().await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(AssistantError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(res.json().await?)
}

/// Threads, messages and runs against a pre-provisioned assistant.
#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    config: OpenAiConfig,
    assistant_id: Option<String>,
    poll_interval: Duration,
    run_timeout: Duration,
    cancel: CancellationToken,
}

#[derive(Deserialize)]
struct Thread {
    id: String,
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
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContent {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}

impl MessageList {
    /// Text of the newest message. The API lists newest first.
    fn latest_text(self) -> Option<String> {
        self.data
            .into_iter()
            .next()?
            .content
            .into_iter()
            .find_map(|c| match c {
                MessageContent::Text { text } => Some(text.value),
                MessageContent::Other => None,
            })
    }
}

impl AssistantClient {
    pub fn new(config: OpenAiConfig, assistant_id: Option<String>) -> Result<Self> {
        Ok(Self {
            client: authorized_client(&config, true)?,
            config,
            assistant_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_run_limits(mut self, poll_interval: Duration, run_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.run_timeout = run_timeout;
        self
    }

    /// Token that aborts in-flight run waits when cancelled.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    pub async fn create_thread(&self) -> Result<String> {
        let thread: Thread = send_json(
            self.client
                .post(self.config.endpoint("threads"))
                .json(&serde_json::json!({})),
        )
        .await?;
        Ok(thread.id)
    }

    pub async fn add_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let _: serde_json::Value = send_json(
            self.client
                .post(self.config.endpoint(&format!("threads/{thread_id}/messages")))
                .json(&NewMessage {
                    role: "user",
                    content,
                }),
        )
        .await?;
        Ok(())
    }

    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        send_json(
            self.client
                .post(self.config.endpoint(&format!("threads/{thread_id}/runs")))
                .json(&NewRun { assistant_id }),
        )
        .await
    }

    pub async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        send_json(
            self.client
                .get(self.config.endpoint(&format!("threads/{thread_id}/runs/{run_id}"))),
        )
        .await
    }

    pub async fn latest_message(&self, thread_id: &str) -> Result<String> {
        let list: MessageList = send_json(
            self.client
                .get(self.config.endpoint(&format!("threads/{thread_id}/messages"))),
        )
        .await?;
        list.latest_text().ok_or(AssistantError::EmptyResponse)
    }
}

#[async_trait]
impl ConversationAgent for AssistantClient {
    #[instrument(name = "start_thread", skip(self))]
    async fn start_thread(&self) -> Result<String> {
        let thread_id = self.create_thread().await?;
        info!(thread_id = %thread_id, "thread started");
        Ok(thread_id)
    }

    #[instrument(name = "assistant_reply", skip(self, content))]
    async fn reply(&self, thread_id: &str, content: &str) -> Result<String> {
        let assistant_id = self
            .assistant_id
            .as_deref()
            .ok_or(AssistantError::MissingAssistant)?;

        self.add_message(thread_id, content).await?;
        let run = self.create_run(thread_id, assistant_id).await?;
        debug!(run_id = %run.id, status = %run.status, "run created");

        wait_for_run(
            &run.id,
            || self.retrieve_run(thread_id, &run.id),
            self.poll_interval,
            self.run_timeout,
            &self.cancel,
        )
        .await?;

        self.latest_message(thread_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_text_takes_first_message_first_text_block() {
        let json = r#"{
            "object": "list",
            "data": [
                {"id": "msg_2", "role": "assistant", "content": [
                    {"type": "image_file", "image_file": {"file_id": "f"}},
                    {"type": "text", "text": {"value": "Reliance looks stable.", "annotations": []}}
                ]},
                {"id": "msg_1", "role": "user", "content": [
                    {"type": "text", "text": {"value": "User Query: ...", "annotations": []}}
                ]}
            ]
        }"#;

        let list: MessageList = serde_json::from_str(json).unwrap();
        assert_eq!(list.latest_text().as_deref(), Some("Reliance looks stable."));
    }

    #[test]
    fn empty_thread_has_no_text() {
        let list: MessageList = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(list.latest_text().is_none());
    }

    #[test]
    fn new_message_serializes_as_user_turn() {
        let body = serde_json::to_value(NewMessage {
            role: "user",
            content: "hello",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"role": "user", "content": "hello"}));
    }

    #[tokio::test]
    async fn reply_without_assistant_fails_fast() {
        let client = AssistantClient::new(OpenAiConfig::new("sk-test"), None).unwrap();
        let err = client.reply("thread_1", "hi").await.unwrap_err();
        assert!(matches!(err, AssistantError::MissingAssistant));
    }
}
