//! Common type definitions shared across the extraction pipeline.
//!
//! This module defines:
//! - Type aliases for entity IDs ([`UserId`])
//! - The inference [`Tier`] and monthly [`BudgetBand`] enums
//! - The image [`Fingerprint`] cache key
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Identifier of the user an extraction request belongs to. Supplied by the
/// external auth collaborator and trusted as already verified.
pub type UserId = Uuid;

/// Content hash of the input image, used as the result-cache key.
pub type Fingerprint = String;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Which inference path produced a result.
///
/// `Cached` is never the input to an inference call; it only appears in cost
/// log entries for zero-cost cache hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Cheap text-based inference over pre-computed OCR text.
    Lite,
    /// Expensive vision-capable inference over the raw image.
    Deep,
    /// No inference performed; result served from the result cache.
    Cached,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Lite => "lite",
            Tier::Deep => "deep",
            Tier::Cached => "cached",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lite" => Ok(Tier::Lite),
            "deep" => Ok(Tier::Deep),
            "cached" => Ok(Tier::Cached),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// Budget band for a user's current calendar month.
///
/// The bands are mutually exclusive and evaluated in order: blocked wins over
/// force-lite, force-lite wins over normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BudgetBand {
    /// Spend below the force-lite threshold; any tier is allowed.
    Normal,
    /// Spend at or above the force-lite threshold; only the lite tier is allowed.
    ForceLite,
    /// Budget exhausted; no inference is allowed this month.
    Blocked,
}

impl fmt::Display for BudgetBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetBand::Normal => write!(f, "normal"),
            BudgetBand::ForceLite => write!(f, "force_lite"),
            BudgetBand::Blocked => write!(f, "blocked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&uuid), "550e8400");
    }

    #[test]
    fn test_tier_round_trip() {
        for tier in [Tier::Lite, Tier::Deep, Tier::Cached] {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert!("vision".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Lite).unwrap(), "\"lite\"");
        assert_eq!(serde_json::to_string(&Tier::Deep).unwrap(), "\"deep\"");
    }
}
