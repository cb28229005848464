//! Destinations for diagnostics reported outside any recorded execution.

use crate::diagnostic::Diagnostic;
use std::cell::RefCell;

/// Receives diagnostics that no active log can take
pub trait DiagnosticSink {
    /// Deliver one diagnostic
    fn write(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `tracing` at warn level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn write(&self, diagnostic: &Diagnostic) {
        tracing::warn!(error = diagnostic.is_error(), "unrecorded diagnostic: {}", diagnostic);
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    written: RefCell<Vec<Diagnostic>>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics written so far
    #[must_use]
    pub fn written(&self) -> Vec<Diagnostic> {
        self.written.borrow().clone()
    }

    /// Rendered text of diagnostics written so far
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.written.borrow().iter().map(|d| d.text().to_string()).collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn write(&self, diagnostic: &Diagnostic) {
        self.written.borrow_mut().push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.write(&Diagnostic::message("one"));
        sink.write(&Diagnostic::value(2u8));
        assert_eq!(sink.texts(), vec!["one", "2"]);
        assert_eq!(sink.written().len(), 2);
    }

    #[test]
    fn test_tracing_sink_accepts_without_subscriber() {
        TracingSink.write(&Diagnostic::message("dropped into the void"));
    }
}
