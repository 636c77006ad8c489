use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::info;

use crate::{AppState, error::ChatError};

pub async fn start(state: web::Data<AppState>) -> Result<HttpResponse, ChatError> {
    info!("start: creating conversation thread");

    let thread_id = state.agent.start_thread().await?;

    info!(thread_id = %thread_id, "start: thread ready");
    Ok(HttpResponse::Ok().json(json!({ "thread_id": thread_id })))
}
