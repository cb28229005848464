//! Recall Core Types
//!
//! Key parts and key sequences that identify memoized calls, plus the
//! configuration shared by the cache engine and the memoizer.
//! This crate contains pure types and logic with no I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod key;

// Re-exports
pub use config::RecallConfig;
pub use error::{ConfigError, ConfigResult};
pub use key::{KeyArgs, KeyPart, RefKey, Symbol, ToKeyPart, ValueKey};
