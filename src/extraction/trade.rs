use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Tolerant parse of whatever the model wrote for the side field.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Some(Side::Long),
            "short" | "sell" => Some(Side::Short),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// How long the position was open, already broken down for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TradeDuration {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

/// One normalized trade extracted from a screenshot.
///
/// Constructed once per extraction and immutable thereafter. Numeric fields
/// are always present (0 when the model omitted them) so downstream
/// aggregation never branches on null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExtractedTrade {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub position_size: f64,
    pub leverage: f64,
    pub realized_pnl: f64,
    pub funding_fee: f64,
    pub trading_fee: f64,
    pub roi: f64,
    /// Open timestamp as reported by the broker, verbatim
    pub opened_at: String,
    /// Close timestamp as reported by the broker, verbatim; empty if open
    pub closed_at: String,
    pub duration: TradeDuration,
    pub notes: String,
}

#[cfg(test)]
impl ExtractedTrade {
    /// Minimal trade for tests that only care about identity and count.
    pub(crate) fn sample(symbol: &str, side: Side) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            entry_price: 0.0,
            exit_price: 0.0,
            position_size: 0.0,
            leverage: 0.0,
            realized_pnl: 0.0,
            funding_fee: 0.0,
            trading_fee: 0.0,
            roi: 0.0,
            opened_at: String::new(),
            closed_at: String::new(),
            duration: TradeDuration::default(),
            notes: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parse_tolerant() {
        assert_eq!(Side::parse("LONG"), Some(Side::Long));
        assert_eq!(Side::parse(" Short "), Some(Side::Short));
        assert_eq!(Side::parse("buy"), Some(Side::Long));
        assert_eq!(Side::parse("sell"), Some(Side::Short));
        assert_eq!(Side::parse("sideways"), None);
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Long).unwrap(), "\"long\"");
        assert_eq!(serde_json::to_string(&Side::Short).unwrap(), "\"short\"");
    }
}
