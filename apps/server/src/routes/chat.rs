use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{AppState, error::ChatError, pipeline};

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn chat(
    state: web::Data<AppState>,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse, ChatError> {
    let ChatRequest { thread_id, message } = body.into_inner();
    let message = message.unwrap_or_default();

    info!("chat: received thread_id={:?} message={:?}", thread_id, message);

    let Some(thread_id) = thread_id.filter(|id| !id.trim().is_empty()) else {
        warn!("chat: missing thread_id");
        return Err(ChatError::MissingThreadId);
    };

    let response = pipeline::answer(&state, &thread_id, &message).await?;

    Ok(HttpResponse::Ok().json(json!({ "response": response })))
}
