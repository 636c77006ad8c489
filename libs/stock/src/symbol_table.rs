use std::{collections::BTreeMap, io::Read};

use anyhow::{Context, Error, bail};
use reqwest::{Client, header::USER_AGENT};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_SYMBOLS_SOURCE: &str =
    "https://archives.nseindia.com/content/equities/EQUITY_L.csv";
pub const DEFAULT_MARKET_SUFFIX: &str = ".NS";

const SYMBOL_HEADER: &str = "SYMBOL";
const NAME_HEADER: &str = "NAME OF COMPANY";
const BROWSER_AGENT: &str = "Mozilla/5.0";

/// Lookup from lowercase company name or symbol to canonical ticker.
///
/// Built once at startup and shared read-only afterwards. Keys iterate in
/// lexicographic order, which is what fuzzy tie-breaking relies on.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: BTreeMap<String, String>,
}

impl SymbolTable {
    fn normalize(key: &str) -> String {
        key.trim().to_lowercase()
    }

    /// Build from `(key, ticker)` pairs. Later pairs overwrite earlier ones.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self::default();
        for (key, ticker) in entries {
            table.insert(key.as_ref(), ticker.into());
        }
        table
    }

    fn insert(&mut self, key: &str, ticker: String) {
        let key = Self::normalize(key);
        let ticker = ticker.trim().to_string();
        if key.is_empty() || ticker.is_empty() {
            return;
        }
        self.entries.insert(key, ticker);
    }

    /// Parse an exchange equity listing.
    ///
    /// Every row contributes two keys, the symbol and the company name,
    /// both mapping to `SYMBOL + suffix`.
    pub fn from_csv<R: Read>(reader: R, suffix: &str) -> Result<Self, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);

        let (Some(symbol_idx), Some(name_idx)) = (column(SYMBOL_HEADER), column(NAME_HEADER))
        else {
            bail!(
                "symbol listing is missing `{}` or `{}` column (found: {:?})",
                SYMBOL_HEADER,
                NAME_HEADER,
                headers.iter().collect::<Vec<_>>()
            );
        };

        let mut table = Self::default();
        let mut skipped = 0usize;

        for record in rdr.records() {
            let record = record?;
            let symbol = record.get(symbol_idx).unwrap_or_default().trim();
            if symbol.is_empty() {
                skipped += 1;
                continue;
            }
            let ticker = format!("{symbol}{suffix}");

            table.insert(symbol, ticker.clone());
            if let Some(name) = record.get(name_idx) {
                table.insert(name, ticker);
            }
        }

        if skipped > 0 {
            warn!(skipped, "skipped listing rows without a symbol");
        }

        Ok(table)
    }

    /// Load the listing from an `http(s)` URL or a local file path.
    #[instrument(name = "load_symbol_table", skip(client))]
    pub async fn load(client: &Client, source: &str, suffix: &str) -> Result<Self, Error> {
        let table = if source.starts_with("http://") || source.starts_with("https://") {
            let body = client
                .get(source)
                .header(USER_AGENT, BROWSER_AGENT)
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;
            debug!(bytes = body.len(), "downloaded symbol listing");
            Self::from_csv(body.as_ref(), suffix)?
        } else {
            let file = std::fs::File::open(source)
                .with_context(|| format!("open symbol listing {source}"))?;
            Self::from_csv(file, suffix)?
        };

        info!(entries = table.len(), "symbol table loaded");
        Ok(table)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&Self::normalize(key)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical ticker whose bare part (before the market suffix) equals
    /// `bare`.
    pub fn find_bare_ticker(&self, bare: &str) -> Option<&str> {
        self.entries
            .values()
            .map(String::as_str)
            .find(|ticker| bare_ticker(ticker) == bare)
    }
}

/// Ticker without its market qualifier, e.g. `RELIANCE` for `RELIANCE.NS`.
pub fn bare_ticker(ticker: &str) -> &str {
    ticker.split('.').next().unwrap_or(ticker)
}
