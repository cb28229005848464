//! Context configuration.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Configuration for a memoization context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Minimum number of edge inserts between automatic purges of dead keys
    pub sweep_min_len: usize,
    /// Emit a `tracing` event for every memoized call
    pub trace_calls: bool,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            sweep_min_len: 32,
            trace_calls: false,
        }
    }
}

impl RecallConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid JSON or a field is out of range
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the minimum number of inserts between automatic purges
    #[must_use]
    pub fn with_sweep_min_len(mut self, len: usize) -> Self {
        self.sweep_min_len = len;
        self
    }

    /// Enable or disable call tracing
    #[must_use]
    pub fn with_trace_calls(mut self, enabled: bool) -> Self {
        self.trace_calls = enabled;
        self
    }

    /// Check field ranges
    ///
    /// # Errors
    ///
    /// Returns error if `sweep_min_len` is zero
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sweep_min_len == 0 {
            return Err(ConfigError::Invalid {
                field: "sweep_min_len",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
