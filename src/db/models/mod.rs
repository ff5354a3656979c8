//! Row models for the extraction service's four tables.
//!
//! These are storage-layer shapes; API DTOs live in [`crate::api::models`]
//! and domain types in [`crate::extraction`].

pub mod budgets;
pub mod cache;
pub mod cost_log;

pub use budgets::BudgetRow;
pub use cache::CacheRow;
pub use cost_log::{CostLogCreate, CostLogRow};
