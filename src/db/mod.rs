//! Storage layer: the [`ExtractionStore`] trait plus its Postgres and
//! in-memory implementations.

pub mod errors;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::ExtractionStore;
