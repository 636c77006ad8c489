//! In-process stand-ins for the external providers.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Error, anyhow};
use assistant::{AssistantError, ConversationAgent};
use async_trait::async_trait;
use chrono::Utc;
use stock::{MarketData, NewsProvider, Quote, SymbolResolver, SymbolTable, TextExtractor};

use crate::AppState;

pub struct StubExtractor(pub String);

#[async_trait]
impl TextExtractor for StubExtractor {
    async fn extract_candidate(&self, _message: &str) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}

pub enum StubMarket {
    Known,
    Unknown,
    Failing,
}

impl StubMarket {
    pub fn known() -> Self {
        StubMarket::Known
    }

    pub fn unknown() -> Self {
        StubMarket::Unknown
    }

    pub fn failing() -> Self {
        StubMarket::Failing
    }
}

#[async_trait]
impl MarketData for StubMarket {
    async fn fetch_quote(&self, ticker: &str) -> Result<Option<Quote>, Error> {
        match self {
            StubMarket::Known => Ok(Some(Quote {
                ticker: ticker.to_string(),
                name: "Reliance Industries Limited".to_string(),
                current_price: Some(2951.0),
                market_cap: Some(1.996e13),
                pe_ratio: Some(28.4),
                dividend_yield: None,
                fifty_two_week_high: Some(3217.6),
                fifty_two_week_low: Some(2220.3),
                eps: Some(103.9),
                beta: None,
                fetched_at: Utc::now(),
            })),
            StubMarket::Unknown => Ok(None),
            StubMarket::Failing => Err(anyhow!("connection reset")),
        }
    }
}

pub struct StubNews;

#[async_trait]
impl NewsProvider for StubNews {
    async fn headlines(&self, company: &str) -> Vec<String> {
        vec![format!("{company} headline")]
    }
}

#[derive(Clone)]
pub struct StubAgent {
    reply: Option<String>,
    sent: Arc<Mutex<Option<(String, String)>>>,
}

impl StubAgent {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            sent: Arc::default(),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            reply: None,
            sent: Arc::default(),
        }
    }

    pub fn last_sent(&self) -> Option<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationAgent for StubAgent {
    async fn start_thread(&self) -> assistant::Result<String> {
        Ok("thread_stub".to_string())
    }

    async fn reply(&self, thread_id: &str, content: &str) -> assistant::Result<String> {
        *self.sent.lock().unwrap() = Some((thread_id.to_string(), content.to_string()));
        self.reply.clone().ok_or(AssistantError::RunTimeout {
            run_id: "run_stub".to_string(),
            waited: Duration::from_secs(120),
        })
    }
}

/// State over a two-entry table whose extractor always yields `candidate`.
pub fn state(candidate: &str, market: StubMarket, agent: StubAgent) -> AppState {
    let table = SymbolTable::from_entries([("reliance", "RELIANCE.NS"), ("tcs", "TCS.NS")]);

    AppState {
        resolver: SymbolResolver::new(Arc::new(table)),
        extractor: Arc::new(StubExtractor(candidate.to_string())),
        market: Arc::new(market),
        news: Arc::new(StubNews),
        agent: Arc::new(agent),
    }
}
