//! Heuristic sizing of expected extraction output from OCR text.
//!
//! Three independent signals are computed and the maximum wins: under-estimating
//! is worse than over-estimating, because the estimate drives both output token
//! budgets and the cache bypass rule. The single computed value is passed to
//! both consumers; it is never recomputed divergently.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Ticker-like tokens: 3-6 letters optionally followed by a USDT/USD suffix.
static SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-z]{3,6})(usdt|usd)?\b").expect("symbol regex"));

/// Side mentions; each trade typically names its side twice (open + close rows).
static SIDE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(long|short)\b").expect("side regex"));

/// YYYY-MM-DD or YYYY/MM/DD; each trade carries an open and a close date.
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}[-/]\d{2}[-/]\d{2}\b").expect("date regex"));

/// Common trade-history vocabulary that the loose symbol pattern would
/// otherwise count as tickers.
static STOPWORDS: &[&str] = &[
    "long", "short", "buy", "sell", "open", "close", "closed", "entry", "exit", "price", "size",
    "amount", "fee", "fees", "total", "date", "time", "pnl", "roi", "usd", "usdt", "filled", "qty",
    "market", "limit", "profit", "loss",
];

#[derive(Debug, Clone, Copy)]
pub struct TradeCountEstimator {
    max_trades: u32,
}

impl TradeCountEstimator {
    pub fn new(max_trades: u32) -> Self {
        Self {
            max_trades: max_trades.max(1),
        }
    }

    /// Estimate how many trades the screenshot likely contains, in
    /// `[1, max_trades]`. Deterministic for a given input; empty or absent
    /// text yields exactly 1.
    pub fn estimate(&self, ocr_text: Option<&str>) -> u32 {
        let text = match ocr_text {
            Some(text) if !text.trim().is_empty() => text,
            _ => return 1,
        };

        let symbols = self.count_symbols(text);
        let sides = SIDE_RE.find_iter(text).count() as u32 / 2;
        let dates = DATE_RE.find_iter(text).count() as u32 / 2;

        symbols.max(sides).max(dates).clamp(1, self.max_trades)
    }

    fn count_symbols(&self, text: &str) -> u32 {
        let mut seen: HashSet<String> = HashSet::new();
        for caps in SYMBOL_RE.captures_iter(text) {
            let full = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            let lowered = full.to_ascii_lowercase();
            if STOPWORDS.contains(&lowered.as_str()) {
                continue;
            }
            // Bare 3-6 letter words only count when written ticker-style
            // (all caps) or when they carry a USDT/USD suffix.
            if caps.get(2).is_none() && full.chars().any(|c| c.is_ascii_lowercase()) {
                continue;
            }
            seen.insert(lowered);
        }
        seen.len() as u32
    }
}
