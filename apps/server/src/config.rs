use std::{env::var, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use stock::{
    DEFAULT_MARKET_SUFFIX, DEFAULT_MATCH_THRESHOLD, DEFAULT_PER_SOURCE, DEFAULT_QUOTE_TIMEOUT,
    DEFAULT_SYMBOLS_SOURCE, DEFAULT_TOTAL_LIMIT,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub symbols_source: String,
    pub market_suffix: String,
    pub assistant_file: String,
    pub match_threshold: u8,
    pub news_per_source: usize,
    pub news_limit: usize,
    pub run_poll_interval: Duration,
    pub run_timeout: Duration,
    pub http_timeout: Duration,
    pub version: String,
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("PORT", 8080)?,
            symbols_source: var("SYMBOLS_SOURCE")
                .unwrap_or_else(|_| DEFAULT_SYMBOLS_SOURCE.to_string()),
            market_suffix: var("MARKET_SUFFIX")
                .unwrap_or_else(|_| DEFAULT_MARKET_SUFFIX.to_string()),
            assistant_file: var("ASSISTANT_FILE")
                .unwrap_or_else(|_| "assistant.json".to_string()),
            match_threshold: parsed("MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD)?,
            news_per_source: parsed("NEWS_PER_SOURCE", DEFAULT_PER_SOURCE)?,
            news_limit: parsed("NEWS_LIMIT", DEFAULT_TOTAL_LIMIT)?,
            run_poll_interval: Duration::from_millis(parsed("RUN_POLL_INTERVAL_MS", 1000)?),
            run_timeout: Duration::from_secs(parsed("RUN_TIMEOUT_SECS", 120)?),
            http_timeout: Duration::from_secs(parsed(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_QUOTE_TIMEOUT.as_secs(),
            )?),
            version: var("APP_VERSION").unwrap_or_else(|_| "Unknown".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_uses_default() {
        let value: u16 = parsed("STOCKBOT_TEST_UNSET_VARIABLE", 8080).unwrap();
        assert_eq!(value, 8080);
    }

    #[test]
    fn outbound_requests_are_bounded_by_default() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }
}
