//! Infrastructure layer: storage adapters, instrumentation, configuration and
//! bounded-context wiring for the dispatch core.

pub mod config;
pub mod finance;
pub mod repository;
pub mod traced;

pub use config::{ConfigError, ContextConfig};
pub use finance::Finance;
pub use repository::{InMemoryRepository, StoredSnapshot};
pub use traced::Traced;
