//! Normalization of repaired model output onto the fixed [`ExtractedTrade`]
//! shape.
//!
//! Field names are resolved through an explicit ordered alias table rather
//! than duck-typed access, so the table is unit-testable in isolation.
//! Missing numerics become 0 and missing strings become "" to keep downstream
//! arithmetic total.

use crate::errors::Error;
use crate::extraction::trade::{ExtractedTrade, Side, TradeDuration};
use serde_json::Value;

/// `(canonical, aliases)` resolved first-match, canonical name first.
const ALIASES: &[(&str, &[&str])] = &[
    ("symbol", &["symbol", "asset", "ticker", "pair", "market", "instrument"]),
    ("side", &["side", "position_type", "direction", "position", "trade_type"]),
    ("entry_price", &["entry_price", "entry", "open_price", "avg_entry_price", "entryprice"]),
    ("exit_price", &["exit_price", "exit", "close_price", "avg_exit_price", "exitprice"]),
    ("position_size", &["position_size", "size", "quantity", "qty", "amount"]),
    ("leverage", &["leverage", "lev"]),
    ("realized_pnl", &["realized_pnl", "pnl", "realized_profit", "closed_pnl", "profit"]),
    ("funding_fee", &["funding_fee", "funding"]),
    ("trading_fee", &["trading_fee", "fee", "fees", "commission"]),
    ("roi", &["roi", "roi_percent", "return_pct", "roe"]),
    ("opened_at", &["opened_at", "open_time", "opened", "entry_time", "open_date"]),
    ("closed_at", &["closed_at", "close_time", "closed", "exit_time", "close_date"]),
    ("duration_days", &["duration_days", "days"]),
    ("duration_hours", &["duration_hours", "hours"]),
    ("duration_minutes", &["duration_minutes", "minutes"]),
    ("notes", &["notes", "note", "comment", "remarks"]),
];

/// Resolve a canonical field from a raw model-produced object.
fn resolve<'v>(obj: &'v serde_json::Map<String, Value>, canonical: &str) -> Option<&'v Value> {
    let aliases = ALIASES
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, aliases)| *aliases)?;
    for alias in aliases {
        // Model output casing varies; match keys case-insensitively.
        if let Some((_, value)) = obj.iter().find(|(key, _)| key.eq_ignore_ascii_case(alias)) {
            if !value.is_null() {
                return Some(value);
            }
        }
    }
    None
}

/// Numeric coercion tolerant of the string forms models emit ("$1,234.5",
/// "12.3%"). Absent or unusable values become 0.
fn number(obj: &serde_json::Map<String, Value>, canonical: &str) -> f64 {
    match resolve(obj, canonical) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

fn string(obj: &serde_json::Map<String, Value>, canonical: &str) -> String {
    match resolve(obj, canonical) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalize the repaired JSON value into trades.
///
/// Accepts either a bare array or an object wrapping one under `trades`.
/// Individual objects missing a usable symbol or side are dropped with a
/// warning; more than `max_trades` surviving trades is a [`Error::TooManyTrades`]
/// defect, never a silent truncation.
pub fn normalize_trades(value: &Value, max_trades: usize) -> Result<Vec<ExtractedTrade>, Error> {
    let items = trade_array(value).ok_or(Error::UnparseableOutput)?;

    let mut trades = Vec::with_capacity(items.len());
    for item in items {
        let Some(obj) = item.as_object() else {
            tracing::warn!("Skipping non-object entry in model trade array");
            continue;
        };
        match normalize_one(obj) {
            Some(trade) => trades.push(trade),
            None => {
                tracing::warn!("Skipping trade entry without usable symbol/side");
            }
        }
    }

    if trades.len() > max_trades {
        return Err(Error::TooManyTrades {
            count: trades.len(),
            max: max_trades,
        });
    }
    Ok(trades)
}

/// Locate the trade array inside whatever container the model chose.
fn trade_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(obj) => obj
            .get("trades")
            .or_else(|| obj.get("data"))
            .or_else(|| obj.get("results"))
            .and_then(Value::as_array),
        _ => None,
    }
}

fn normalize_one(obj: &serde_json::Map<String, Value>) -> Option<ExtractedTrade> {
    let symbol = string(obj, "symbol").trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return None;
    }
    let side = Side::parse(&string(obj, "side"))?;

    Some(ExtractedTrade {
        symbol,
        side,
        entry_price: number(obj, "entry_price"),
        exit_price: number(obj, "exit_price"),
        position_size: number(obj, "position_size"),
        leverage: number(obj, "leverage"),
        realized_pnl: number(obj, "realized_pnl"),
        funding_fee: number(obj, "funding_fee"),
        trading_fee: number(obj, "trading_fee"),
        roi: number(obj, "roi"),
        opened_at: string(obj, "opened_at"),
        closed_at: string(obj, "closed_at"),
        duration: TradeDuration {
            days: number(obj, "duration_days") as i64,
            hours: number(obj, "duration_hours") as i64,
            minutes: number(obj, "duration_minutes") as i64,
        },
        notes: string(obj, "notes"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aliases_resolve_first_match() {
        let value = json!([{
            "asset": "btcusdt",
            "position_type": "LONG",
            "entry": 42000.5,
            "close_price": 43750.0,
            "qty": "0.5",
            "closed_pnl": "$874.75",
            "open_time": "2024-01-01 08:30",
        }]);
        let trades = normalize_trades(&value, 10).unwrap();
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.symbol, "BTCUSDT");
        assert_eq!(trade.side, Side::Long);
        assert_eq!(trade.entry_price, 42000.5);
        assert_eq!(trade.exit_price, 43750.0);
        assert_eq!(trade.position_size, 0.5);
        assert_eq!(trade.realized_pnl, 874.75);
        assert_eq!(trade.opened_at, "2024-01-01 08:30");
    }

    #[test]
    fn test_missing_numerics_default_zero_not_null() {
        let value = json!([{ "symbol": "ETHUSDT", "side": "short" }]);
        let trades = normalize_trades(&value, 10).unwrap();
        let trade = &trades[0];
        assert_eq!(trade.entry_price, 0.0);
        assert_eq!(trade.exit_price, 0.0);
        assert_eq!(trade.leverage, 0.0);
        assert_eq!(trade.funding_fee, 0.0);
        assert_eq!(trade.trading_fee, 0.0);
        assert_eq!(trade.roi, 0.0);
        assert_eq!(trade.duration, TradeDuration::default());
        assert_eq!(trade.opened_at, "");
        assert_eq!(trade.notes, "");
        // serialized form carries every numeric field
        let serialized = serde_json::to_value(trade).unwrap();
        assert_eq!(serialized["exit_price"], 0.0);
        assert!(!serialized["roi"].is_null());
    }

    #[test]
    fn test_side_lowercased() {
        for raw in ["LONG", "Long", "long"] {
            let value = json!([{ "symbol": "BTCUSDT", "side": raw }]);
            let trades = normalize_trades(&value, 10).unwrap();
            assert_eq!(serde_json::to_value(trades[0].side).unwrap(), "long");
        }
    }

    #[test]
    fn test_wrapped_object_forms() {
        for key in ["trades", "data", "results"] {
            let value = json!({ key: [{ "symbol": "BTCUSDT", "side": "long" }] });
            assert_eq!(normalize_trades(&value, 10).unwrap().len(), 1, "{key}");
        }
    }

    #[test]
    fn test_cap_rejects_rather_than_truncates() {
        let items: Vec<Value> = (0..11)
            .map(|i| json!({ "symbol": format!("SYM{i}"), "side": "long" }))
            .collect();
        let err = normalize_trades(&Value::Array(items), 10).unwrap_err();
        match err {
            Error::TooManyTrades { count, max } => {
                assert_eq!(count, 11);
                assert_eq!(max, 10);
            }
            other => panic!("expected TooManyTrades, got {other}"),
        }
    }

    #[test]
    fn test_cap_is_configurable_independently() {
        let items: Vec<Value> = (0..5)
            .map(|i| json!({ "symbol": format!("SYM{i}"), "side": "short" }))
            .collect();
        assert!(normalize_trades(&Value::Array(items.clone()), 4).is_err());
        assert_eq!(normalize_trades(&Value::Array(items), 5).unwrap().len(), 5);
    }

    #[test]
    fn test_unusable_entries_are_dropped() {
        let value = json!([
            { "symbol": "BTCUSDT", "side": "long" },
            { "side": "long" },
            { "symbol": "ETHUSDT", "side": "diagonal" },
            "not an object",
        ]);
        let trades = normalize_trades(&value, 10).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "BTCUSDT");
    }

    #[test]
    fn test_scalar_value_is_unparseable() {
        assert!(matches!(
            normalize_trades(&json!("just text"), 10),
            Err(Error::UnparseableOutput)
        ));
    }

    #[test]
    fn test_percent_strings_coerce() {
        let value = json!([{ "symbol": "SOLUSDT", "side": "long", "roi": "12.5%" }]);
        let trades = normalize_trades(&value, 10).unwrap();
        assert_eq!(trades[0].roi, 12.5);
    }
}
