//! The memoization context: one cache, one recorder, one tracer slot.

use crate::memoized::Memoized;
use crate::stats::RecallStats;
use crate::trace::{Tracer, TracingTracer};
use recall_core::{KeyArgs, KeyPart, RecallConfig};
use recall_log::{DiagnosticSink, Recorder, SlotGuard, TracingSink};
use recall_trie::{KeyedCache, PurgeReport};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt;
use std::rc::{Rc, Weak};

/// Type-erased cache value; the leading key part (a function identity plus
/// its handle type) fixes the concrete type behind it.
pub(crate) type Stored = Rc<dyn Any>;

const WRAP: &str = "recall::wrap";

struct Context {
    cache: KeyedCache<Stored>,
    recorder: Recorder,
    tracer: RefCell<Option<Rc<dyn Tracer>>>,
    stats: Cell<RecallStats>,
    config: RecallConfig,
}

/// Handle to a memoization context.
///
/// Cloning is cheap and every clone shares the same cache. Separate
/// contexts never share entries, which keeps tests independent.
#[derive(Clone)]
pub struct Recall {
    inner: Rc<Context>,
}

impl Recall {
    /// Create a context with default config
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RecallConfig::default())
    }

    /// Create a context with custom config
    #[must_use]
    pub fn with_config(config: RecallConfig) -> Self {
        Self::build(config, Rc::new(TracingSink))
    }

    /// Create a context whose unrecorded diagnostics go to `sink`
    #[must_use]
    pub fn with_sink(sink: Rc<dyn DiagnosticSink>) -> Self {
        Self::build(RecallConfig::default(), sink)
    }

    /// Create a context from config and sink
    #[must_use]
    pub fn build(config: RecallConfig, sink: Rc<dyn DiagnosticSink>) -> Self {
        let tracer: Option<Rc<dyn Tracer>> = if config.trace_calls {
            Some(Rc::new(TracingTracer))
        } else {
            None
        };
        Self {
            inner: Rc::new(Context {
                cache: KeyedCache::with_config(&config),
                recorder: Recorder::with_sink(sink),
                tracer: RefCell::new(tracer),
                stats: Cell::new(RecallStats::new()),
                config,
            }),
        }
    }

    /// Config this context was built with
    #[must_use]
    pub fn config(&self) -> &RecallConfig {
        &self.inner.config
    }

    /// Memoize `func`.
    ///
    /// Wrapping is itself memoized on the identity of `func`: while a
    /// handle for it is alive, wrapping the same `Rc` again returns that
    /// same handle.
    pub fn wrap<A, T, E, F>(&self, func: Rc<F>) -> Memoized<A, T, E>
    where
        A: KeyArgs + 'static,
        T: Clone + 'static,
        E: Clone + 'static,
        F: Fn(A) -> Result<T, E> + 'static,
    {
        let target = KeyPart::identity(&func);
        let key = [
            KeyPart::symbol(WRAP),
            KeyPart::type_of::<Memoized<A, T, E>>(),
            target.clone(),
        ];
        let inner = self.intern(&key, || Memoized::<A, T, E>::new_inner(self.clone(), func, target));
        Memoized::from_inner(inner)
    }

    /// Memoize a fresh closure. Each call creates a distinct function
    /// identity, so keep the returned handle rather than wrapping again.
    pub fn wrap_fn<A, T, E, F>(&self, func: F) -> Memoized<A, T, E>
    where
        A: KeyArgs + 'static,
        T: Clone + 'static,
        E: Clone + 'static,
        F: Fn(A) -> Result<T, E> + 'static,
    {
        self.wrap(Rc::new(func))
    }

    /// Shared handle stored under `key`, or the one `make` builds.
    ///
    /// The cache keeps only a weak reference to the handle, so a handle
    /// never keeps its own key parts alive. Once every clone of it is
    /// dropped the next call builds a new one and overwrites the entry.
    pub fn intern<H: 'static>(&self, key: &[KeyPart], make: impl FnOnce() -> Rc<H>) -> Rc<H> {
        let entry = self.inner.cache.entry(key);
        let live = entry
            .value()
            .and_then(|stored| stored.downcast::<Weak<H>>().ok())
            .and_then(|weak| weak.upgrade());
        if let Some(handle) = live {
            return handle;
        }
        let handle = make();
        entry.set(Rc::new(Rc::downgrade(&handle)) as Stored);
        handle
    }

    /// Report an arbitrary value and hand it back
    pub fn report<T: Any + fmt::Debug + Clone>(&self, value: T) -> T {
        self.inner.recorder.report(value)
    }

    /// Report an error without failing, and hand it back
    pub fn report_error<E: Error + Clone + 'static>(&self, error: E) -> E {
        self.inner.recorder.report_error(error)
    }

    /// Report a text message
    pub fn report_message(&self, text: impl Into<String>) {
        self.inner.recorder.report_message(text);
    }

    /// Check if a memoized execution is currently running
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.inner.recorder.is_recording()
    }

    /// Run `body` with `tracer` observing calls; the previous tracer is
    /// restored afterwards.
    pub fn with_tracer<R>(&self, tracer: Rc<dyn Tracer>, body: impl FnOnce() -> R) -> R {
        let _scope = SlotGuard::enter(&self.inner.tracer, Some(tracer));
        body()
    }

    /// Hit and miss counters
    #[must_use]
    pub fn stats(&self) -> RecallStats {
        self.inner.stats.get()
    }

    /// Zero the hit and miss counters
    pub fn reset_stats(&self) {
        let mut stats = self.inner.stats.get();
        stats.reset();
        self.inner.stats.set(stats);
    }

    /// Number of live cache entries, interned handles included
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Drop every entry whose key has an unreachable part
    pub fn purge(&self) -> PurgeReport {
        self.inner.cache.purge()
    }

    /// Check if both handles refer to the same context
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn cache(&self) -> &KeyedCache<Stored> {
        &self.inner.cache
    }

    pub(crate) fn recorder(&self) -> &Recorder {
        &self.inner.recorder
    }

    pub(crate) fn tracer(&self) -> Option<Rc<dyn Tracer>> {
        self.inner.tracer.borrow().clone()
    }

    pub(crate) fn record_lookup(&self, cached: bool) {
        let mut stats = self.inner.stats.get();
        if cached {
            stats.record_hit();
        } else {
            stats.record_miss();
        }
        self.inner.stats.set(stats);
    }
}

impl Default for Recall {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Recall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recall")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
