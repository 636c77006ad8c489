mod chat;
mod home;
mod start;

use actix_web::web;

pub use chat::ChatRequest;
pub use home::LIVENESS;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home::home))
        .route("/start", web::get().to(start::start))
        .route("/chat", web::post().to(chat::chat));
}
