//! Postgres repositories, one per table.
//!
//! Each repository wraps a pool reference and owns the SQL for its table.
//! [`crate::db::postgres::PgStore`] composes them behind the
//! [`crate::db::store::ExtractionStore`] trait.

pub mod budgets;
pub mod cache;
pub mod cost_log;
pub mod rate_events;

pub use budgets::Budgets;
pub use cache::ExtractionCache;
pub use cost_log::CostLog;
pub use rate_events::RateEvents;
