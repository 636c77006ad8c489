mod news_client;
mod quote_client;
mod resolver;
mod symbol_table;

pub mod fuzzy;

pub use news_client::{
    DEFAULT_MONEYCONTROL_BASE_URL, DEFAULT_PER_SOURCE, DEFAULT_TOTAL_LIMIT,
    DEFAULT_YAHOO_FINANCE_BASE_URL, NO_NEWS, NewsClient, NewsProvider, parse_headlines,
};
pub use quote_client::{DEFAULT_QUOTE_TIMEOUT, MarketData, Quote, QuoteClient};
pub use resolver::{DEFAULT_MATCH_THRESHOLD, SymbolResolver, TextExtractor};
pub use symbol_table::{DEFAULT_MARKET_SUFFIX, DEFAULT_SYMBOLS_SOURCE, SymbolTable, bare_ticker};
