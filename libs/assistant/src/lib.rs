mod client;
mod config;
mod error;
mod extractor;
mod run;

pub use client::{AssistantClient, ConversationAgent};
pub use config::{DEFAULT_MODEL, DEFAULT_OPENAI_API_BASE, OpenAiConfig, load_assistant_id};
pub use error::{AssistantError, Result};
pub use extractor::ChatExtractor;
pub use run::{DEFAULT_POLL_INTERVAL, DEFAULT_RUN_TIMEOUT, Run, RunStatus, wait_for_run};
