//! The AI-assisted trade extraction pipeline.
//!
//! Leaf-first: [`estimator`], [`repair`] and [`normalize`] are pure;
//! [`cache`], [`ledger`] and [`rate_limit`] talk to storage; [`router`] is
//! the state machine sequencing them around at most two inference calls.

pub mod cache;
pub mod client;
pub mod estimator;
pub mod ledger;
pub mod normalize;
pub mod prompt;
pub mod rate_limit;
pub mod repair;
pub mod router;
pub mod trade;

pub use client::{HttpInferenceClient, InferenceClient};
pub use ledger::{BudgetStatus, CostLedger};
pub use router::{ExtractionInput, ExtractionOutcome, ExtractionRouter};
pub use trade::{ExtractedTrade, Side, TradeDuration};
