pub const LIVENESS: &str = "Stock Market Chatbot is Running!";

pub async fn home() -> &'static str {
    LIVENESS
}
