//! Error types for recall.
//!
//! Cache lookups never fail; the only fallible surface of the core crate is
//! loading configuration.

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config text was not valid JSON for [`RecallConfig`](crate::RecallConfig)
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value outside its allowed range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Result alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
