use std::sync::Arc;

use assistant::ConversationAgent;
use stock::{MarketData, NewsProvider, SymbolResolver, TextExtractor};

pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;

#[cfg(test)]
mod testing;

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub resolver: SymbolResolver,
    pub extractor: Arc<dyn TextExtractor>,
    pub market: Arc<dyn MarketData>,
    pub news: Arc<dyn NewsProvider>,
    pub agent: Arc<dyn ConversationAgent>,
}
