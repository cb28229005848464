//! Recall Diagnostics and Recording
//!
//! Result records for single executions, the diagnostics logs attached to
//! them, and the recorder that fills those logs while a function runs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diagnostic;
pub mod log;
pub mod outcome;
pub mod recorder;
pub mod scope;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use log::{Log, LogEntry};
pub use outcome::{Exit, ExitKind, Outcome};
pub use recorder::Recorder;
pub use scope::SlotGuard;
pub use sink::{DiagnosticSink, MemorySink, TracingSink};
