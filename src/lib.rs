//! Cross-entity search for the skill platform.
//!
//! - [`search`]: query expressions, per-entity handlers and the fan-out
//!   engine over a tantivy-backed document store
//! - [`sync`]: queue consumers that keep the indices current
//! - [`messaging`]: Kafka, NATS and in-memory queue backends
//! - [`api`]: the HTTP surface

pub mod api;
pub mod config;
pub mod error;
pub mod messaging;
pub mod search;
pub mod sync;

pub use error::{AppError, Result};
