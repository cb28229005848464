//! Memoized function handles.

use crate::context::{Recall, Stored};
use crate::trace::CallEvent;
use recall_core::{KeyArgs, KeyPart};
use recall_log::Outcome;
use std::fmt;
use std::rc::Rc;

pub(crate) struct MemoInner<A, T, E> {
    ctx: Recall,
    func: Rc<dyn Fn(A) -> Result<T, E>>,
    target: KeyPart,
}

/// A memoized function.
///
/// Calls with equivalent argument lists share one recorded [`Outcome`]:
/// the wrapped function runs at most once per argument list for as long as
/// every identity-keyed argument stays alive. Handles are cheap to clone.
pub struct Memoized<A, T, E> {
    inner: Rc<MemoInner<A, T, E>>,
}

impl<A, T, E> Memoized<A, T, E>
where
    A: KeyArgs + 'static,
    T: Clone + 'static,
    E: Clone + 'static,
{
    pub(crate) fn new_inner<F>(ctx: Recall, func: Rc<F>, target: KeyPart) -> Rc<MemoInner<A, T, E>>
    where
        F: Fn(A) -> Result<T, E> + 'static,
    {
        Rc::new(MemoInner { ctx, func, target })
    }

    pub(crate) fn from_inner(inner: Rc<MemoInner<A, T, E>>) -> Self {
        Self { inner }
    }

    /// Call through the cache.
    ///
    /// When called inside another recorded execution, the log of the
    /// record is attached to the enclosing log, on cache hits too.
    ///
    /// # Errors
    ///
    /// Returns the recorded error if the wrapped function failed
    pub fn call(&self, args: A) -> Result<T, E> {
        let outcome = self.get_result(args);
        self.inner.ctx.recorder().report_log(outcome.log());
        outcome.to_result()
    }

    /// Recorded outcome for `args`, executing the function on a miss.
    ///
    /// The log is not attached to any enclosing execution.
    pub fn get_result(&self, args: A) -> Rc<Outcome<T, E>> {
        let ctx = &self.inner.ctx;
        let target = &self.inner.target;
        let key = args.key_sequence(target.clone());
        let tracer = ctx.tracer();
        let entry = ctx.cache().entry(&key);

        if let Some(stored) = entry.value() {
            match stored.downcast::<Outcome<T, E>>() {
                Ok(outcome) => {
                    ctx.record_lookup(true);
                    if let Some(tracer) = &tracer {
                        let started = CallEvent::started(target, &key[1..], true);
                        tracer.call_started(&started);
                        tracer.call_ended(&started.ended(outcome.exit_kind(), &*outcome));
                    }
                    return outcome;
                }
                Err(_) => {
                    tracing::warn!(target_fn = %target, "cached record has another type, recomputing");
                }
            }
        }

        ctx.record_lookup(false);
        let started = CallEvent::started(target, &key[1..], false);
        if let Some(tracer) = &tracer {
            tracer.call_started(&started);
        }
        let outcome = Rc::new(ctx.recorder().execute(&*self.inner.func, args));
        entry.set(Rc::clone(&outcome) as Stored);
        tracing::trace!(target_fn = %target, exit = ?outcome.exit_kind(), "recorded call");
        if let Some(tracer) = &tracer {
            tracer.call_ended(&started.ended(outcome.exit_kind(), &*outcome));
        }
        outcome
    }

    /// Recorded outcome for `args`, if one exists. Never executes.
    #[must_use]
    pub fn get_existing(&self, args: &A) -> Option<Rc<Outcome<T, E>>> {
        let key = args.key_sequence(self.inner.target.clone());
        self.inner
            .ctx
            .cache()
            .get(&key)
            .and_then(|stored| stored.downcast::<Outcome<T, E>>().ok())
    }
}

impl<A, T, E> Memoized<A, T, E> {
    /// Key part identifying the wrapped function
    #[must_use]
    pub fn target(&self) -> &KeyPart {
        &self.inner.target
    }

    /// Context this handle caches into
    #[must_use]
    pub fn context(&self) -> &Recall {
        &self.inner.ctx
    }

    /// Check if both handles are the same memoized function
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<A, T, E> Clone for Memoized<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A, T, E> fmt::Debug for Memoized<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("target", &self.inner.target.to_string())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{TraceLog, TracePhase, Tracer};
    use recall_log::{DiagnosticSink, ExitKind, MemorySink};
    use std::cell::{Cell, OnceCell, RefCell};
    use std::convert::Infallible;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    #[error("{0}")]
    struct Oops(String);

    fn oops(text: &str) -> Oops {
        Oops(text.to_string())
    }

    #[test]
    fn test_success_is_cached() {
        let ctx = Recall::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let double = ctx.wrap_fn(move |(x,): (u32,)| {
            counter.set(counter.get() + 1);
            Ok::<_, Infallible>(x * 2)
        });

        let first = double.get_result((4,));
        let second = double.get_result((4,));
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(double.call((4,)), Ok(8));
        assert_eq!(calls.get(), 1);
        assert_eq!(double.call((5,)), Ok(10));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_failure_is_cached() {
        let ctx = Recall::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let fail = ctx.wrap_fn(move |(): ()| {
            counter.set(counter.get() + 1);
            Err::<u32, _>(oops("Nope"))
        });

        assert_eq!(fail.call(()), Err(oops("Nope")));
        assert_eq!(fail.call(()), Err(oops("Nope")));
        let outcome = fail.get_result(());
        assert!(outcome.did_throw());
        assert_eq!(outcome.exit_kind(), ExitKind::Threw);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_reported_errors_do_not_fail() {
        let ctx = Recall::new();
        let inner_ctx = ctx.clone();
        let hopeful = ctx.wrap_fn(move |(): ()| {
            inner_ctx.report_error(oops("already going badly"));
            inner_ctx.report_error(oops("we can still try"));
            inner_ctx.report_error(oops("to go on"));
            Ok::<_, Oops>("and we made it")
        });

        let outcome = hopeful.get_result(());
        assert!(outcome.did_return());
        assert_eq!(outcome.returned(), Some(&"and we made it"));
        let errors: Vec<String> = outcome.errors().map(ToString::to_string).collect();
        assert_eq!(errors, vec!["already going badly", "we can still try", "to go on"]);
    }

    #[test]
    fn test_arguments_are_positional() {
        let ctx = Recall::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let join = ctx.wrap_fn(move |(a, b): (&'static str, &'static str)| {
            counter.set(counter.get() + 1);
            Ok::<_, Infallible>(format!("{a}{b}"))
        });

        assert_eq!(join.call(("a", "b")), Ok("ab".to_string()));
        assert_eq!(join.call(("a", "b")), Ok("ab".to_string()));
        assert_eq!(join.call(("b", "a")), Ok("ba".to_string()));
        assert_eq!(join.call(("a", "c")), Ok("ac".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_mixed_arity_arguments_are_positional() {
        let ctx = Recall::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let join = ctx.wrap_fn(move |parts: Vec<&'static str>| {
            counter.set(counter.get() + 1);
            Ok::<_, Infallible>(parts.concat())
        });

        assert_eq!(join.call(vec!["a", "b", "c"]), Ok("abc".to_string()));
        assert_eq!(join.call(vec!["a", "b", "c"]), Ok("abc".to_string()));
        assert_eq!(join.call(vec!["b", "a", "c"]), Ok("bac".to_string()));
        assert_eq!(join.call(vec!["a", "c", "a", "b"]), Ok("acab".to_string()));
        assert_eq!(join.call(vec!["a", "c", "a", "b"]), Ok("acab".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_identity_arguments_ignore_contents() {
        let ctx = Recall::new();
        let sum = ctx.wrap_fn(|(list,): (Rc<RefCell<Vec<u32>>>,)| {
            Ok::<_, Infallible>(list.borrow().iter().sum::<u32>())
        });

        let list = Rc::new(RefCell::new(vec![1, 2]));
        assert_eq!(sum.call((Rc::clone(&list),)), Ok(3));
        list.borrow_mut().push(10);
        // Same object, so the stale record is replayed.
        assert_eq!(sum.call((Rc::clone(&list),)), Ok(3));

        let equal_copy = Rc::new(RefCell::new(vec![1, 2, 10]));
        assert_eq!(sum.call((equal_copy,)), Ok(13));
    }

    #[test]
    fn test_wrapping_twice_returns_same_handle() {
        let ctx = Recall::new();
        let func = Rc::new(|(x,): (i64,)| Ok::<_, Infallible>(-x));
        let first = ctx.wrap(Rc::clone(&func));
        let second = ctx.wrap(Rc::clone(&func));
        assert!(first.ptr_eq(&second));
        assert_eq!(first.target(), second.target());
        assert!(first.context().ptr_eq(&ctx));

        let other = ctx.wrap(Rc::new(|(x,): (i64,)| Ok::<_, Infallible>(-x)));
        assert!(!first.ptr_eq(&other));
    }

    #[test]
    fn test_rewrap_after_drop_keeps_results() {
        let ctx = Recall::new();
        let func = Rc::new(|(x,): (u8,)| Ok::<_, Infallible>(x));
        let first = ctx.wrap(Rc::clone(&func));
        first.call((1,)).unwrap();
        drop(first);

        let second = ctx.wrap(Rc::clone(&func));
        // Results are keyed on the function, so the record outlives the handle.
        assert!(second.get_existing(&(1,)).is_some());
        assert!(second.ptr_eq(&ctx.wrap(func)));
    }

    #[test]
    fn test_call_reports_nested_log_on_hit() {
        let ctx = Recall::new();
        let inner_ctx = ctx.clone();
        let noisy = ctx.wrap_fn(move |(): ()| {
            inner_ctx.report_message("from inside");
            Ok::<_, Infallible>(1)
        });

        let via_call = noisy.clone();
        let outer = ctx.wrap_fn(move |(round,): (u8,)| {
            via_call.call(()).map(|v| v + round)
        });
        let via_result = noisy.clone();
        let inspector = ctx.wrap_fn(move |(round,): (u8,)| {
            Ok::<_, Infallible>(via_result.get_result(()).returned().copied().unwrap_or(0) + round)
        });

        // First round executes `noisy`, second replays it.
        assert_eq!(outer.get_result((1,)).log().texts(), vec!["from inside"]);
        assert_eq!(outer.get_result((2,)).log().texts(), vec!["from inside"]);
        assert!(inspector.get_result((1,)).log().is_empty());
    }

    #[test]
    fn test_get_existing_never_executes() {
        let ctx = Recall::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let square = ctx.wrap_fn(move |(x,): (u32,)| {
            counter.set(counter.get() + 1);
            Ok::<_, Infallible>(x * x)
        });

        assert!(square.get_existing(&(3,)).is_none());
        assert_eq!(calls.get(), 0);
        square.call((3,)).unwrap();
        let existing = square.get_existing(&(3,));
        assert_eq!(existing.and_then(|o| o.returned().copied()), Some(9));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_functions_do_not_share_entries() {
        let ctx = Recall::new();
        let inc = ctx.wrap_fn(|(x,): (i32,)| Ok::<_, Infallible>(x + 1));
        let dec = ctx.wrap_fn(|(x,): (i32,)| Ok::<_, Infallible>(x - 1));
        assert_eq!(inc.call((10,)), Ok(11));
        assert_eq!(dec.call((10,)), Ok(9));
    }

    #[test]
    fn test_reentrant_recursion() {
        let ctx = Recall::new();
        let slot: Rc<OnceCell<Memoized<(u64,), u64, Infallible>>> = Rc::new(OnceCell::new());
        let this = Rc::clone(&slot);
        let fib = ctx.wrap_fn(move |(n,): (u64,)| -> Result<u64, Infallible> {
            if n < 2 {
                return Ok(n);
            }
            let Some(fib) = this.get() else { return Ok(0) };
            Ok(fib.call((n - 1,))? + fib.call((n - 2,))?)
        });
        assert!(slot.set(fib.clone()).is_ok());

        assert_eq!(fib.call((40,)), Ok(102_334_155));
        assert_eq!(ctx.stats().misses, 41);
        assert!(!ctx.is_recording());
    }

    #[test]
    fn test_dropped_argument_is_reclaimed() {
        let ctx = Recall::new();
        let len = ctx.wrap_fn(|(s,): (Rc<str>,)| Ok::<_, Infallible>(s.len()));
        let text: Rc<str> = Rc::from("reclaim me");
        assert_eq!(len.call((Rc::clone(&text),)), Ok(10));
        let before = ctx.cache_len();

        drop(text);
        assert_eq!(ctx.cache_len(), before - 1);
        let report = ctx.purge();
        assert_eq!(report.reclaimed_values, 1);
    }

    #[test]
    fn test_dropped_function_frees_results() {
        let ctx = Recall::new();
        let bytes = ctx.wrap_fn(|(n,): (u32,)| Ok::<_, Infallible>(Rc::new(vec![0u8; n as usize % 8])));
        let results: Vec<std::rc::Weak<Vec<u8>>> = (0..200u32)
            .map(|n| bytes.call((n,)).map(|r| Rc::downgrade(&r)).unwrap_or_else(|never| match never {}))
            .collect();
        drop(bytes);

        let square = ctx.wrap_fn(|(n,): (u32,)| Ok::<_, Infallible>(n * n));
        for n in 1000..1600u32 {
            assert_eq!(square.call((n,)), Ok(n * n));
        }

        assert_eq!(results.iter().filter(|r| r.strong_count() > 0).count(), 0);
    }

    #[test]
    fn test_trace_log_sequence() {
        let ctx = Recall::new();
        let log = Rc::new(TraceLog::new());
        let f = ctx.wrap_fn(|(x,): (u8,)| {
            if x == 0 {
                Err(oops("zero"))
            } else {
                Ok(x)
            }
        });
        ctx.with_tracer(Rc::clone(&log) as Rc<dyn Tracer>, || {
            let _ = f.call((0,));
            let _ = f.call((0,));
            let _ = f.call((2,));
        });

        let entries = log.entries();
        let summary: Vec<(TracePhase, bool, Option<ExitKind>)> =
            entries.iter().map(|e| (e.phase, e.cached, e.exit)).collect();
        assert_eq!(
            summary,
            vec![
                (TracePhase::Started, false, None),
                (TracePhase::Ended, false, Some(ExitKind::Threw)),
                (TracePhase::Started, true, None),
                (TracePhase::Ended, true, Some(ExitKind::Threw)),
                (TracePhase::Started, false, None),
                (TracePhase::Ended, false, Some(ExitKind::Returned)),
            ]
        );
        assert_eq!(entries[4].args, vec!["2"]);
        assert_eq!(entries[0].target, f.target().to_string());
    }

    #[test]
    fn test_stats_count_hits_and_misses() {
        let ctx = Recall::new();
        let id = ctx.wrap_fn(|(x,): (u8,)| Ok::<_, Infallible>(x));
        id.call((1,)).unwrap();
        id.call((1,)).unwrap();
        id.call((1,)).unwrap();
        id.call((2,)).unwrap();
        let stats = ctx.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_reports_inside_calls_bypass_sink() {
        let sink = Rc::new(MemorySink::new());
        let ctx = Recall::with_sink(Rc::clone(&sink) as Rc<dyn DiagnosticSink>);
        let inner_ctx = ctx.clone();
        let f = ctx.wrap_fn(move |(): ()| {
            inner_ctx.report_message("recorded");
            Ok::<_, Infallible>(())
        });
        f.call(()).unwrap();
        ctx.report_message("loose");
        assert_eq!(sink.texts(), vec!["loose"]);
    }

    #[test]
    fn test_debug_shows_target() {
        let ctx = Recall::new();
        let f = ctx.wrap_fn(|(): ()| Ok::<_, Infallible>(()));
        assert!(format!("{:?}", f).starts_with("Memoized"));
    }
}
