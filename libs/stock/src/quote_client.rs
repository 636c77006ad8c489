use std::{fmt, time::Duration};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Error code Yahoo puts in the summary envelope for an unknown symbol.
const NOT_FOUND_CODE: &str = "Not Found";

/// Source of current quote data for a canonical ticker.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// `Ok(None)` when the provider does not recognise the ticker.
    async fn fetch_quote(&self, ticker: &str) -> Result<Option<Quote>, Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub ticker: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub eps: Option<f64>,
    pub beta: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

struct OrNa(Option<f64>);

impl fmt::Display for OrNa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("N/A"),
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Name: {}, Current Price: {}, Market Cap: {}, PE Ratio: {}, Dividend Yield: {}, \
             52-Week High: {}, 52-Week Low: {}, EPS: {}, Beta: {}}}",
            self.name,
            OrNa(self.current_price),
            OrNa(self.market_cap),
            OrNa(self.pe_ratio),
            OrNa(self.dividend_yield),
            OrNa(self.fifty_two_week_high),
            OrNa(self.fifty_two_week_low),
            OrNa(self.eps),
            OrNa(self.beta),
        )
    }
}

/// Yahoo Finance quote summary client.
///
/// The connector caches the session cookie and crumb Yahoo requires and
/// refreshes the crumb when it is rejected, so it is shared behind a lock.
pub struct QuoteClient {
    connector: Mutex<yahoo::YahooConnector>,
}

impl QuoteClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let connector = yahoo::YahooConnector::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("building yahoo finance connector: {e}"))?;

        Ok(Self {
            connector: Mutex::new(connector),
        })
    }
}

#[async_trait]
impl MarketData for QuoteClient {
    #[instrument(name = "fetch_quote", skip(self))]
    async fn fetch_quote(&self, ticker: &str) -> Result<Option<Quote>, Error> {
        let summary = self.connector.lock().await.get_ticker_info(ticker).await?;
        summary_into_quote(summary, ticker, Utc::now())
    }
}

fn envelope_error(summary: &yahoo::YQuoteSummary) -> Option<String> {
    let err = summary
        .quote_summary
        .as_ref()
        .and_then(|s| s.error.as_ref())
        .or_else(|| summary.finance.as_ref().and_then(|f| f.error.as_ref()))?;

    Some(
        err.code
            .clone()
            .or_else(|| err.description.clone())
            .unwrap_or_else(|| "unknown error".to_string()),
    )
}

/// Map a quote summary onto a [`Quote`].
///
/// A `Not Found` envelope, an empty result list or a record without a long
/// name is an unrecognised ticker. Any other envelope error is a failure.
fn summary_into_quote(
    summary: yahoo::YQuoteSummary,
    ticker: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Option<Quote>, Error> {
    if let Some(code) = envelope_error(&summary) {
        if code == NOT_FOUND_CODE {
            debug!("ticker not recognised by provider");
            return Ok(None);
        }
        return Err(anyhow!("yahoo finance returned an error for {ticker}: {code}"));
    }

    let Some(data) = summary
        .quote_summary
        .and_then(|s| s.result)
        .and_then(|r| r.into_iter().next())
    else {
        debug!("empty quote summary");
        return Ok(None);
    };

    let Some(name) = data
        .quote_type
        .and_then(|q| q.long_name)
        .filter(|n| !n.trim().is_empty())
    else {
        debug!("quote summary without a long name");
        return Ok(None);
    };

    let detail = data.summary_detail;
    let stats = data.default_key_statistics;
    let detail_field = |f: fn(&yahoo::SummaryDetail) -> Option<f64>| detail.as_ref().and_then(f);

    Ok(Some(Quote {
        ticker: ticker.to_string(),
        name,
        current_price: data.financial_data.and_then(|f| f.current_price),
        market_cap: detail.as_ref().and_then(|d| d.market_cap).map(|v| v as f64),
        pe_ratio: detail_field(|d| d.trailing_pe),
        dividend_yield: detail_field(|d| d.dividend_yield),
        fifty_two_week_high: detail_field(|d| d.fifty_two_week_high),
        fifty_two_week_low: detail_field(|d| d.fifty_two_week_low),
        eps: stats.as_ref().and_then(|s| s.trailing_eps),
        beta: detail_field(|d| d.beta).or_else(|| stats.as_ref().and_then(|s| s.beta)),
        fetched_at,
    }))
}
