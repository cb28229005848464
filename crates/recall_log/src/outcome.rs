//! Result records of recorded executions.

use crate::log::Log;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// How an execution ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit<T, E> {
    /// Returned `Ok(T)`
    Returned(T),
    /// Returned `Err(E)`
    Threw(E),
}

/// Exit discriminant without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    /// Execution returned a value
    Returned,
    /// Execution failed with an error
    Threw,
}

/// Immutable record of one execution: how it ended and what it reported
#[derive(Debug, Clone)]
pub struct Outcome<T, E> {
    exit: Exit<T, E>,
    log: Log,
}

impl<T, E> Outcome<T, E> {
    /// Create a record from a result and its log
    #[must_use]
    pub fn new(result: Result<T, E>, log: Log) -> Self {
        let exit = match result {
            Ok(value) => Exit::Returned(value),
            Err(error) => Exit::Threw(error),
        };
        Self { exit, log }
    }

    /// How the execution ended
    #[must_use]
    pub const fn exit(&self) -> &Exit<T, E> {
        &self.exit
    }

    /// Exit discriminant
    #[must_use]
    pub const fn exit_kind(&self) -> ExitKind {
        match self.exit {
            Exit::Returned(_) => ExitKind::Returned,
            Exit::Threw(_) => ExitKind::Threw,
        }
    }

    /// Check if the execution returned a value
    #[must_use]
    pub const fn did_return(&self) -> bool {
        matches!(self.exit, Exit::Returned(_))
    }

    /// Check if the execution failed
    #[must_use]
    pub const fn did_throw(&self) -> bool {
        matches!(self.exit, Exit::Threw(_))
    }

    /// Returned value, if any
    #[must_use]
    pub const fn returned(&self) -> Option<&T> {
        match &self.exit {
            Exit::Returned(value) => Some(value),
            Exit::Threw(_) => None,
        }
    }

    /// Error, if the execution failed
    #[must_use]
    pub const fn thrown(&self) -> Option<&E> {
        match &self.exit {
            Exit::Returned(_) => None,
            Exit::Threw(error) => Some(error),
        }
    }

    /// Diagnostics reported during the execution
    #[must_use]
    pub const fn log(&self) -> &Log {
        &self.log
    }

    /// Consume the record into its result
    pub fn into_result(self) -> Result<T, E> {
        match self.exit {
            Exit::Returned(value) => Ok(value),
            Exit::Threw(error) => Err(error),
        }
    }
}

impl<T: Clone, E: Clone> Outcome<T, E> {
    /// Replay the recorded result
    ///
    /// # Errors
    ///
    /// Returns the recorded error if the execution failed
    pub fn to_result(&self) -> Result<T, E> {
        match &self.exit {
            Exit::Returned(value) => Ok(value.clone()),
            Exit::Threw(error) => Err(error.clone()),
        }
    }
}

impl<T, E: Error + 'static> Outcome<T, E> {
    /// Errors reported to the log, followed by the failure itself
    pub fn errors(&self) -> impl Iterator<Item = &(dyn Error + 'static)> {
        self.log
            .errors()
            .chain(self.thrown().map(|error| error as &(dyn Error + 'static)))
    }
}
