//! Error types for replay cursors.

use thiserror::Error;

/// Errors raised while advancing a replay cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The shared source iterator is already being advanced further up
    /// the stack, so this cursor cannot advance it again.
    #[error("Replay source is already running")]
    AlreadyRunning,
}

/// Result type for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;
