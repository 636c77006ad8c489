use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to read assistant file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse assistant file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no assistant configured")]
    MissingAssistant,

    #[error("assistant returned no text content")]
    EmptyResponse,

    #[error("run {run_id} ended with status {status}")]
    RunFailed { run_id: String, status: String },

    #[error("run {run_id} did not complete within {waited:?}")]
    RunTimeout { run_id: String, waited: Duration },

    #[error("run wait cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AssistantError::RunFailed {
            run_id: "run_1".to_string(),
            status: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "run run_1 ended with status failed");

        let err = AssistantError::RunTimeout {
            run_id: "run_2".to_string(),
            waited: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "run run_2 did not complete within 3s");
    }
}
