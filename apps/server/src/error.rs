use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use assistant::AssistantError;
use serde_json::json;
use thiserror::Error;

pub const COULD_NOT_IDENTIFY: &str =
    "Could not identify the stock. Please try again with a valid company name or symbol.";
pub const STOCK_NOT_FOUND: &str = "Stock data not found! Try another company.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Missing thread_id")]
    MissingThreadId,

    #[error("{}", COULD_NOT_IDENTIFY)]
    Unidentified,

    #[error("{}", STOCK_NOT_FOUND)]
    StockNotFound,

    #[error("stock extraction failed: {0}")]
    Extraction(anyhow::Error),

    #[error(transparent)]
    Agent(#[from] AssistantError),
}

impl ResponseError for ChatError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChatError::MissingThreadId | ChatError::Unidentified | ChatError::StockNotFound => {
                StatusCode::BAD_REQUEST
            }
            ChatError::Extraction(_) => StatusCode::BAD_GATEWAY,
            ChatError::Agent(e) => match e {
                AssistantError::RunTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                AssistantError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                AssistantError::MissingAssistant | AssistantError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            // user-facing outcomes travel in `response` so chat front ends render them
            ChatError::Unidentified | ChatError::StockNotFound => {
                json!({ "response": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
