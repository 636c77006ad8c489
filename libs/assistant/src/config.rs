use std::{path::Path, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{AssistantError, Result};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_base: String,
    /// Model used for candidate extraction.
    pub model: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `OPENAI_API_KEY` (required), `OPENAI_API_BASE` and `OPENAI_MODEL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            AssistantError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let mut config = Self::new(api_key);
        if let Ok(base) = std::env::var("OPENAI_API_BASE") {
            config.api_base = base;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct AssistantFile {
    assistant_id: String,
}

/// Read a previously provisioned assistant id from `{"assistant_id": "..."}`.
///
/// A missing file is not an error; agent calls will fail later instead.
pub fn load_assistant_id(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "no assistant file found");
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)?;
    let file: AssistantFile = serde_json::from_str(&raw)?;
    info!(assistant_id = %file.assistant_id, "assistant loaded");
    Ok(Some(file.assistant_id))
}
