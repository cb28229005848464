//! Call tracing hooks.
//!
//! A [`Tracer`] sees every memoized lookup twice: once before the cache is
//! consulted or the function runs, and once with the resulting record.

use recall_core::KeyPart;
use recall_log::ExitKind;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::RefCell;

/// A memoized call as seen by a [`Tracer`]
#[derive(Clone, Copy)]
pub struct CallEvent<'a> {
    /// Identity of the wrapped function
    pub target: &'a KeyPart,
    /// Argument key parts, in position order
    pub args: &'a [KeyPart],
    /// Whether the result came from the cache
    pub cached: bool,
    /// How the call ended; `None` on the start event
    pub exit: Option<ExitKind>,
    /// The `Outcome<T, E>` record; `None` on the start event
    pub record: Option<&'a dyn Any>,
}

impl<'a> CallEvent<'a> {
    /// Event emitted before a lookup resolves
    #[must_use]
    pub fn started(target: &'a KeyPart, args: &'a [KeyPart], cached: bool) -> Self {
        Self {
            target,
            args,
            cached,
            exit: None,
            record: None,
        }
    }

    /// The matching end event, carrying the record
    #[must_use]
    pub fn ended(self, exit: ExitKind, record: &'a dyn Any) -> Self {
        Self {
            exit: Some(exit),
            record: Some(record),
            ..self
        }
    }

    /// Arguments rendered as `a, b, c`
    #[must_use]
    pub fn render_args(&self) -> String {
        self.args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Observer of memoized calls
pub trait Tracer {
    /// A call is about to be looked up or executed
    fn call_started(&self, event: &CallEvent<'_>);

    /// A call produced (or replayed) its record
    fn call_ended(&self, event: &CallEvent<'_>);
}

/// Emits one `tracing` debug event per call boundary
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTracer;

impl Tracer for TracingTracer {
    fn call_started(&self, event: &CallEvent<'_>) {
        tracing::debug!(
            target_fn = %event.target,
            args = %event.render_args(),
            cached = event.cached,
            "memoized call started"
        );
    }

    fn call_ended(&self, event: &CallEvent<'_>) {
        tracing::debug!(
            target_fn = %event.target,
            args = %event.render_args(),
            cached = event.cached,
            exit = ?event.exit,
            "memoized call ended"
        );
    }
}

/// Call boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracePhase {
    /// Before lookup
    Started,
    /// After the record is known
    Ended,
}

/// Owned, serializable copy of a [`CallEvent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Call boundary
    pub phase: TracePhase,
    /// Rendered function identity
    pub target: String,
    /// Rendered arguments
    pub args: Vec<String>,
    /// Whether the result came from the cache
    pub cached: bool,
    /// How the call ended
    pub exit: Option<ExitKind>,
}

impl TraceEntry {
    fn capture(phase: TracePhase, event: &CallEvent<'_>) -> Self {
        Self {
            phase,
            target: event.target.to_string(),
            args: event.args.iter().map(ToString::to_string).collect(),
            cached: event.cached,
            exit: event.exit,
        }
    }
}

/// Collects every call event in memory
#[derive(Debug, Default)]
pub struct TraceLog {
    entries: RefCell<Vec<TraceEntry>>,
}

impl TraceLog {
    /// Create an empty trace log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries recorded so far
    #[must_use]
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.borrow().clone()
    }

    /// Get entry count
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if nothing was traced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Serialize to JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&*self.entries.borrow())
    }
}

impl Tracer for TraceLog {
    fn call_started(&self, event: &CallEvent<'_>) {
        self.entries
            .borrow_mut()
            .push(TraceEntry::capture(TracePhase::Started, event));
    }

    fn call_ended(&self, event: &CallEvent<'_>) {
        self.entries
            .borrow_mut()
            .push(TraceEntry::capture(TracePhase::Ended, event));
    }
}
