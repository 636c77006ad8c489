use anyhow::{Error, Result};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use scraper::{Html, Selector};
use tracing::{debug, info_span, warn};
use tracing_futures::Instrument;

pub const DEFAULT_MONEYCONTROL_BASE_URL: &str = "https://www.moneycontrol.com";
pub const DEFAULT_YAHOO_FINANCE_BASE_URL: &str = "https://finance.yahoo.com";
pub const DEFAULT_PER_SOURCE: usize = 5;
pub const DEFAULT_TOTAL_LIMIT: usize = 10;

pub const NO_NEWS: &str = "No recent news found.";

/// Best-effort headline lookup. Never fails; problems are reported inline.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn headlines(&self, company: &str) -> Vec<String>;
}

#[derive(Clone)]
pub struct NewsClient {
    client: Client,
    moneycontrol_base: String,
    yahoo_base: String,
    per_source: usize,
    total_limit: usize,
}

impl NewsClient {
    pub fn new(moneycontrol_base: String, yahoo_base: String) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            moneycontrol_base,
            yahoo_base,
            per_source: DEFAULT_PER_SOURCE,
            total_limit: DEFAULT_TOTAL_LIMIT,
        })
    }

    pub fn from_env() -> Result<Self> {
        let moneycontrol = std::env::var("MONEYCONTROL_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_MONEYCONTROL_BASE_URL.to_string());
        let yahoo = std::env::var("YAHOO_FINANCE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_YAHOO_FINANCE_BASE_URL.to_string());
        Self::new(moneycontrol, yahoo)
    }

    pub fn with_limits(mut self, per_source: usize, total_limit: usize) -> Self {
        self.per_source = per_source;
        self.total_limit = total_limit;
        self
    }

    fn moneycontrol_url(&self, company: &str) -> String {
        format!(
            "{}/news/tags/{}.html",
            self.moneycontrol_base.trim_end_matches('/'),
            company.replace(' ', "-")
        )
    }

    fn yahoo_url(&self, company: &str) -> String {
        format!(
            "{}/quote/{}/news",
            self.yahoo_base.trim_end_matches('/'),
            company
        )
    }

    async fn scrape(&self, url: String, tag: &str) -> Result<Vec<String>, Error> {
        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let headlines = parse_headlines(&html, tag, self.per_source)?;
        debug!(count = headlines.len(), "scraped headlines");
        Ok(headlines)
    }
}

#[async_trait]
impl NewsProvider for NewsClient {
    async fn headlines(&self, company: &str) -> Vec<String> {
        let moneycontrol = self
            .scrape(self.moneycontrol_url(company), "h2")
            .instrument(info_span!("moneycontrol_news", company = %company));
        let yahoo = self
            .scrape(self.yahoo_url(company), "h3")
            .instrument(info_span!("yahoo_news", company = %company));

        let (moneycontrol, yahoo) = tokio::join!(moneycontrol, yahoo);

        let mut news = Vec::new();
        collect_source(&mut news, "Moneycontrol", moneycontrol);
        collect_source(&mut news, "Yahoo Finance", yahoo);

        finalize(news, self.total_limit)
    }
}

fn collect_source(news: &mut Vec<String>, source: &str, result: Result<Vec<String>, Error>) {
    match result {
        Ok(headlines) => news.extend(headlines),
        Err(e) => {
            warn!(source, error = ?e, "news scrape failed");
            news.push(format!("Error fetching news from {source}: {e}"));
        }
    }
}

fn finalize(mut news: Vec<String>, total_limit: usize) -> Vec<String> {
    news.truncate(total_limit);
    if news.is_empty() {
        vec![NO_NEWS.to_string()]
    } else {
        news
    }
}

/// Text of the first `limit` non-empty `tag` elements in `html`.
pub fn parse_headlines(html: &str, tag: &str, limit: usize) -> Result<Vec<String>, Error> {
    let selector =
        Selector::parse(tag).map_err(|e| anyhow::anyhow!("invalid selector `{tag}`: {e}"))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .take(limit)
        .collect())
}
