//! HTTP request handlers.
//!
//! Each handler validates and deserializes the request, resolves the caller
//! via [`crate::auth::CurrentUser`], runs the pipeline or storage operation,
//! and serializes the response. Errors convert to JSON error responses
//! through [`crate::errors::Error`].
//!
//! - [`extraction`]: the screenshot extraction endpoint
//! - [`usage`]: budget position and cost history
//! - [`health`]: liveness probe

pub mod extraction;
pub mod health;
pub mod usage;
