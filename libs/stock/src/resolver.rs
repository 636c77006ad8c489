use std::sync::Arc;

use anyhow::Error;
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{fuzzy, symbol_table::SymbolTable};

pub const DEFAULT_MATCH_THRESHOLD: u8 = 80;

/// Longest candidate scored against the table. Company names in the
/// listing stay well below this; anything longer is cut before matching.
pub const MAX_CANDIDATE_CHARS: usize = 100;

/// Pulls the most likely company name or ticker out of a free-text message.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_candidate(&self, message: &str) -> Result<String, Error>;
}

/// Maps free text onto a canonical ticker from a [`SymbolTable`].
#[derive(Debug, Clone)]
pub struct SymbolResolver {
    table: Arc<SymbolTable>,
    threshold: u8,
}

impl SymbolResolver {
    pub fn new(table: Arc<SymbolTable>) -> Self {
        Self::with_threshold(table, DEFAULT_MATCH_THRESHOLD)
    }

    pub fn with_threshold(table: Arc<SymbolTable>, threshold: u8) -> Self {
        Self { table, threshold }
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Resolve an already extracted candidate.
    ///
    /// An exact key wins outright. Otherwise a fuzzy match must score
    /// strictly above the threshold. Failing that, an exact bare ticker
    /// (case-insensitive) is accepted.
    pub fn resolve(&self, candidate: &str) -> Option<String> {
        let candidate: String = candidate
            .trim()
            .to_lowercase()
            .chars()
            .take(MAX_CANDIDATE_CHARS)
            .collect();
        if candidate.is_empty() {
            return None;
        }

        if let Some(ticker) = self.table.get(&candidate) {
            debug!(candidate = %candidate, ticker, "exact key match");
            return Some(ticker.to_string());
        }

        if let Some((key, score)) = fuzzy::best_match(&candidate, self.table.keys()) {
            debug!(candidate = %candidate, key, score, "best fuzzy match");
            if score > self.threshold {
                return self.table.get(key).map(str::to_string);
            }
        }

        let upper = candidate.to_uppercase();
        if let Some(ticker) = self.table.find_bare_ticker(&upper) {
            debug!(candidate = %candidate, ticker, "exact ticker match");
            return Some(ticker.to_string());
        }

        debug!(candidate = %candidate, "no confident match");
        None
    }

    /// Extract a candidate from `message` and resolve it.
    #[instrument(name = "identify_stock", skip(self, extractor))]
    pub async fn identify(
        &self,
        extractor: &dyn TextExtractor,
        message: &str,
    ) -> Result<Option<String>, Error> {
        let candidate = extractor.extract_candidate(message).await?;
        debug!(candidate = %candidate, "extracted candidate");
        Ok(self.resolve(&candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedExtractor(&'static str);

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        async fn extract_candidate(&self, _message: &str) -> Result<String, Error> {
            Ok(self.0.to_string())
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl TextExtractor for FailingExtractor {
        async fn extract_candidate(&self, _message: &str) -> Result<String, Error> {
            Err(anyhow::anyhow!("provider down"))
        }
    }

    fn resolver(entries: &[(&str, &str)]) -> SymbolResolver {
        SymbolResolver::new(Arc::new(SymbolTable::from_entries(
            entries.iter().copied(),
        )))
    }

    #[test]
    fn exact_key_match_is_case_insensitive() {
        let r = resolver(&[("reliance", "RELIANCE.NS"), ("tcs", "TCS.NS")]);
        assert_eq!(r.resolve("Reliance").as_deref(), Some("RELIANCE.NS"));
        assert_eq!(r.resolve("TCS").as_deref(), Some("TCS.NS"));
    }

    #[test]
    fn exact_key_beats_equally_scored_fuzzy_key() {
        // both keys score 100 against "l&t" once punctuation is stripped
        let r = resolver(&[("l t", "WRONG.NS"), ("l&t", "LT.NS")]);
        assert_eq!(r.resolve("l&t").as_deref(), Some("LT.NS"));
        assert_eq!(r.resolve(" L&T ").as_deref(), Some("LT.NS"));
    }

    #[test]
    fn overlong_candidate_is_cut_before_matching() {
        let r = resolver(&[("reliance industries limited", "RELIANCE.NS")]);
        let long = format!("reliance industries limited{}", " x".repeat(50_000));

        let started = std::time::Instant::now();
        let resolved = r.resolve(&long);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(resolved.as_deref(), Some("RELIANCE.NS"));

        let exact = "a".repeat(MAX_CANDIDATE_CHARS);
        let r = resolver(&[(exact.as_str(), "AAA.NS")]);
        assert_eq!(r.resolve(&format!("{exact}bbbb")).as_deref(), Some("AAA.NS"));
    }

    #[test]
    fn close_spelling_matches() {
        let r = resolver(&[("infosys limited", "INFY.NS"), ("wipro limited", "WIPRO.NS")]);
        assert_eq!(r.resolve("infosys").as_deref(), Some("INFY.NS"));
    }

    #[test]
    fn bare_ticker_fallback_when_keys_do_not_match() {
        let r = resolver(&[
            ("housing development finance corporation limited", "HDFC.NS"),
            ("infosys limited", "INFY.NS"),
        ]);
        assert_eq!(r.resolve("hdfc").as_deref(), Some("HDFC.NS"));
    }

    #[test]
    fn garbage_and_empty_resolve_to_none() {
        let r = resolver(&[("reliance", "RELIANCE.NS"), ("tcs", "TCS.NS")]);
        assert_eq!(r.resolve("asdkjalksdj"), None);
        assert_eq!(r.resolve("   "), None);
    }

    #[test]
    fn empty_table_never_resolves() {
        let r = resolver(&[]);
        assert_eq!(r.resolve("reliance"), None);
    }

    #[test]
    fn equal_scores_pick_lexicographically_first_key() {
        let r = resolver(&[("alpha two", "B.NS"), ("alpha one", "A.NS")]);
        let first = r.resolve("alpha");
        assert_eq!(first.as_deref(), Some("A.NS"));
        assert_eq!(r.resolve("alpha"), first);
    }

    #[test]
    fn threshold_is_strict() {
        let table = Arc::new(SymbolTable::from_entries([("relaince", "RLNC.NS")]));
        // "reliance" vs "relaince" scores 88
        assert!(SymbolResolver::with_threshold(table.clone(), 87).resolve("reliance").is_some());
        assert!(SymbolResolver::with_threshold(table, 88).resolve("reliance").is_none());
    }

    #[tokio::test]
    async fn identify_uses_extracted_candidate() {
        let r = resolver(&[("reliance", "RELIANCE.NS"), ("tcs", "TCS.NS")]);
        let ticker = r
            .identify(&FixedExtractor("reliance"), "how is reliance doing")
            .await
            .unwrap();
        assert_eq!(ticker.as_deref(), Some("RELIANCE.NS"));
    }

    #[tokio::test]
    async fn identify_exact_symbol() {
        let r = resolver(&[("tcs", "TCS.NS")]);
        let ticker = r.identify(&FixedExtractor("tcs"), "TCS").await.unwrap();
        assert_eq!(ticker.as_deref(), Some("TCS.NS"));
    }

    #[tokio::test]
    async fn identify_propagates_extractor_errors() {
        let r = resolver(&[("tcs", "TCS.NS")]);
        assert!(r.identify(&FailingExtractor, "TCS").await.is_err());
    }
}
