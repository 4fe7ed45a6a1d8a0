//! Tracing/logging setup shared by processes embedding the dispatch core.

/// Subscriber initialization (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
