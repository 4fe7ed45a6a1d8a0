//! Bounded-context configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Environment variable naming the bounded context.
pub const CONTEXT_ENV: &str = "TELLASK_CONTEXT";

/// Environment variable toggling dispatch instrumentation (`true`/`false`).
pub const TRACE_DISPATCH_ENV: &str = "TELLASK_TRACE_DISPATCH";

pub const DEFAULT_CONTEXT: &str = "finance";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid context configuration: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Bounded-context name reported by the registry.
    pub name: String,
    /// Wrap every aggregate in the tracing decorator.
    pub trace_dispatch: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CONTEXT.to_string(),
            trace_dispatch: true,
        }
    }
}

impl ContextConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Missing or unparsable values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let name = lookup(CONTEXT_ENV)
            .map(|raw| raw.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or(defaults.name);

        let trace_dispatch = match lookup(TRACE_DISPATCH_ENV) {
            Some(raw) => raw.trim().parse::<bool>().unwrap_or_else(|_| {
                warn!(
                    value = %raw,
                    "{TRACE_DISPATCH_ENV} is not a boolean; using {}",
                    defaults.trace_dispatch
                );
                defaults.trace_dispatch
            }),
            None => defaults.trace_dispatch,
        };

        Self {
            name,
            trace_dispatch,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
