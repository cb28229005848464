//! Execution recorder: runs a function once and captures its outcome along
//! with everything it reported.

use crate::diagnostic::Diagnostic;
use crate::log::{Log, LogBuffer, LogEntry};
use crate::outcome::Outcome;
use crate::scope::SlotGuard;
use crate::sink::{DiagnosticSink, TracingSink};
use std::any::Any;
use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

/// Records executions and routes reported diagnostics.
///
/// While [`Recorder::execute`] runs, its fresh log is the active one and
/// every `report*` call appends to it. Nested executions install their own
/// log and restore the outer one when they finish.
pub struct Recorder {
    active: RefCell<Option<LogBuffer>>,
    sink: Rc<dyn DiagnosticSink>,
}

impl Recorder {
    /// Create a recorder whose unrecorded diagnostics go to `tracing`
    #[must_use]
    pub fn new() -> Self {
        Self::with_sink(Rc::new(TracingSink))
    }

    /// Create a recorder with a custom sink for unrecorded diagnostics
    #[must_use]
    pub fn with_sink(sink: Rc<dyn DiagnosticSink>) -> Self {
        Self {
            active: RefCell::new(None),
            sink,
        }
    }

    /// Check if an execution is currently being recorded
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.active.borrow().is_some()
    }

    /// Run `func(args)` with a fresh active log.
    ///
    /// The previous active log is restored before returning, and also if
    /// `func` panics.
    pub fn execute<A, T, E>(&self, func: impl FnOnce(A) -> Result<T, E>, args: A) -> Outcome<T, E> {
        let scope = SlotGuard::enter(&self.active, Some(LogBuffer::default()));
        let result = func(args);
        let log = scope.exit().map(LogBuffer::finish).unwrap_or_default();
        Outcome::new(result, log)
    }

    /// Report an arbitrary value and hand it back
    pub fn report<T: Any + fmt::Debug + Clone>(&self, value: T) -> T {
        self.report_diagnostic(Diagnostic::value(value.clone()));
        value
    }

    /// Report an error without failing, and hand it back
    pub fn report_error<E: Error + Clone + 'static>(&self, error: E) -> E {
        self.report_diagnostic(Diagnostic::error(error.clone()));
        error
    }

    /// Report a text message
    pub fn report_message(&self, text: impl Into<String>) {
        self.report_diagnostic(Diagnostic::message(text));
    }

    /// Append to the active log, or write to the sink when nothing is
    /// being recorded.
    pub fn report_diagnostic(&self, diagnostic: Diagnostic) {
        let unrecorded = match self.active.borrow_mut().as_mut() {
            Some(buffer) => {
                buffer.push(LogEntry::Message(diagnostic));
                None
            }
            None => Some(diagnostic),
        };
        if let Some(diagnostic) = unrecorded {
            self.sink.write(&diagnostic);
        }
    }

    /// Attach `log` to the active log as a nested entry.
    ///
    /// Returns whether it was attached. Empty logs and calls outside any
    /// recorded execution attach nothing.
    pub fn report_log(&self, log: &Log) -> bool {
        if log.is_empty() {
            return false;
        }
        match self.active.borrow_mut().as_mut() {
            Some(buffer) => {
                buffer.push(LogEntry::Nested(log.clone()));
                true
            }
            None => false,
        }
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}
