//! Diagnostics logs.
//!
//! A log is filled while one execution is being recorded and is immutable
//! afterwards. Logs of inner memoized calls are attached as nested entries
//! and flattened transparently on iteration.

use crate::diagnostic::Diagnostic;
use std::any::Any;
use std::error::Error;
use std::rc::Rc;
use std::slice;

/// One entry in a [`Log`]
#[derive(Debug, Clone)]
pub enum LogEntry {
    /// A directly reported value
    Message(Diagnostic),
    /// The log of an inner memoized call
    Nested(Log),
}

/// Ordered diagnostics collected during one execution
#[derive(Debug, Clone)]
pub struct Log {
    entries: Rc<[LogEntry]>,
}

impl Log {
    /// An empty log
    #[must_use]
    pub fn empty() -> Self {
        Self { entries: Rc::from([]) }
    }

    pub(crate) fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries: entries.into() }
    }

    /// Top-level entries, nested logs unflattened
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// All diagnostics, nested logs flattened in report order
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: vec![self.entries.iter()],
        }
    }

    /// Number of diagnostics after flattening
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Check if no diagnostic was reported, at any depth
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Diagnostics reported as errors
    pub fn errors(&self) -> impl Iterator<Item = &(dyn Error + 'static)> {
        self.iter().filter_map(Diagnostic::as_error)
    }

    /// Reported values of type `T`
    pub fn filter<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.iter().filter_map(Diagnostic::downcast_ref::<T>)
    }

    /// Rendered text of every diagnostic
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.iter().map(|d| d.text().to_string()).collect()
    }
}

impl Default for Log {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> IntoIterator for &'a Log {
    type Item = &'a Diagnostic;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Depth-first iterator over a [`Log`]
pub struct Iter<'a> {
    stack: Vec<slice::Iter<'a, LogEntry>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Diagnostic;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(LogEntry::Message(diagnostic)) => return Some(diagnostic),
                Some(LogEntry::Nested(log)) => self.stack.push(log.entries.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Append-only buffer behind the active log of a running execution
#[derive(Debug, Default)]
pub(crate) struct LogBuffer {
    entries: Vec<LogEntry>,
}

impl LogBuffer {
    pub(crate) fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn finish(self) -> Log {
        Log::from_entries(self.entries)
    }
}
