use anyhow::Error;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use stock::TextExtractor;
use tracing::{debug, instrument};

use crate::{
    client::{authorized_client, send_json},
    config::OpenAiConfig,
};

/// Chat-completion backed [`TextExtractor`].
#[derive(Clone)]
pub struct ChatExtractor {
    client: Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct Response {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(crate) fn extraction_prompt(message: &str) -> String {
    format!(
        "Identify the stock name or symbol from this user request: '{message}'. \
         Return only the company name or symbol in lowercase, nothing else."
    )
}

impl ChatExtractor {
    pub fn new(config: OpenAiConfig) -> crate::Result<Self> {
        Ok(Self {
            client: authorized_client(&config, false)?,
            config,
        })
    }
}

#[async_trait]
impl TextExtractor for ChatExtractor {
    #[instrument(name = "extract_candidate", skip(self))]
    async fn extract_candidate(&self, message: &str) -> Result<String, Error> {
        let request = Request {
            model: &self.config.model,
            messages: vec![Message {
                role: "user",
                content: extraction_prompt(message),
            }],
        };

        let response: Response = send_json(
            self.client
                .post(self.config.endpoint("chat/completions"))
                .json(&request),
        )
        .await?;

        let candidate = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        debug!(candidate = %candidate, "extraction complete");
        Ok(candidate)
    }
}
