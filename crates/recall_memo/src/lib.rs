//! Recall Memoizer
//!
//! Wraps functions so that equivalent calls share one recorded outcome.
//! Outcomes carry the diagnostics reported while the function ran, and
//! failures are cached and replayed just like successes.
//!
//! ```
//! use recall_memo::Recall;
//! use std::convert::Infallible;
//!
//! let ctx = Recall::new();
//! let square = ctx.wrap_fn(|(x,): (u64,)| Ok::<_, Infallible>(x * x));
//! assert_eq!(square.call((12,)), Ok(144));
//! assert_eq!(ctx.stats().misses, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod memoized;
pub mod stats;
pub mod trace;

pub use context::Recall;
pub use memoized::Memoized;
pub use stats::RecallStats;
pub use trace::{CallEvent, TraceEntry, TraceLog, TracePhase, Tracer, TracingTracer};

use recall_core::KeyArgs;
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

thread_local! {
    static GLOBAL: Recall = Recall::new();
}

/// The default context of the current thread
#[must_use]
pub fn global() -> Recall {
    GLOBAL.with(Recall::clone)
}

/// Memoize `func` in the default context
pub fn recall<A, T, E, F>(func: Rc<F>) -> Memoized<A, T, E>
where
    A: KeyArgs + 'static,
    T: Clone + 'static,
    E: Clone + 'static,
    F: Fn(A) -> Result<T, E> + 'static,
{
    global().wrap(func)
}

/// Report a value in the default context
pub fn report<T: Any + fmt::Debug + Clone>(value: T) -> T {
    global().report(value)
}

/// Report an error in the default context
pub fn report_error<E: Error + Clone + 'static>(error: E) -> E {
    global().report_error(error)
}
