use stock::{Quote, bare_ticker};
use tracing::{debug, info, instrument, warn};

use crate::{AppState, error::ChatError};

/// Resolve the stock in `message`, gather quote and news, and ask the
/// agent on `thread_id`.
#[instrument(name = "answer", skip(state, message))]
pub async fn answer(state: &AppState, thread_id: &str, message: &str) -> Result<String, ChatError> {
    let ticker = state
        .resolver
        .identify(state.extractor.as_ref(), message)
        .await
        .map_err(ChatError::Extraction)?;

    let Some(ticker) = ticker else {
        warn!(message, "could not identify stock");
        return Err(ChatError::Unidentified);
    };
    info!(ticker = %ticker, "resolved ticker");

    let quote = match state.market.fetch_quote(&ticker).await {
        Ok(Some(quote)) => quote,
        Ok(None) => {
            warn!(ticker = %ticker, "no market data for ticker");
            return Err(ChatError::StockNotFound);
        }
        Err(e) => {
            warn!(ticker = %ticker, error = ?e, "market data fetch failed");
            return Err(ChatError::StockNotFound);
        }
    };
    debug!(quote = %quote, "fetched quote");

    let news = state.news.headlines(bare_ticker(&ticker)).await;
    debug!(headlines = news.len(), "fetched news");

    let query = compose_query(message, &quote, &news);

    info!("sending context to assistant");
    let reply = state.agent.reply(thread_id, &query).await?;
    info!(chars = reply.len(), "assistant responded");

    Ok(reply)
}

pub fn compose_query(message: &str, quote: &Quote, news: &[String]) -> String {
    format!("User Query: {message}\nStock Data: {quote}\nRecent News: {news:?}\n")
}
