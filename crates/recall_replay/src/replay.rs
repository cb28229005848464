//! Replay handles for sequence-producing functions.

use crate::cursor::{ReplayCursor, SharedSource, SharedSteps};
use recall_core::{KeyArgs, KeyPart};
use recall_memo::{Memoized, Recall};
use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

const REPLAY: &str = "recall::replay";

struct ReplayInner<A, I: Iterator> {
    source: Memoized<A, SharedSource<I>, Infallible>,
    record: Memoized<(SharedSource<I>,), SharedSteps<I::Item>, Infallible>,
}

/// A function returning an iterator, memoized as a replayable sequence.
///
/// Each [`call`](Replay::call) returns a fresh cursor. Cursors for
/// equivalent arguments share one source iterator, created by the first
/// call, and the items it produced so far.
pub struct Replay<A, I: Iterator> {
    inner: Rc<ReplayInner<A, I>>,
}

impl<A, I> Replay<A, I>
where
    A: KeyArgs + 'static,
    I: Iterator + 'static,
    I::Item: Clone + 'static,
{
    /// Replay `func` through `ctx`.
    ///
    /// While a handle for `func` is alive, replaying the same `Rc` again
    /// returns that same handle.
    pub fn new<F>(ctx: &Recall, func: Rc<F>) -> Self
    where
        F: Fn(A) -> I + 'static,
    {
        let key = [
            KeyPart::symbol(REPLAY),
            KeyPart::type_of::<Self>(),
            KeyPart::identity(&func),
        ];
        let inner = ctx.intern(&key, || {
            let source = ctx.wrap_fn(move |args: A| Ok::<_, Infallible>(Rc::new(RefCell::new(func(args)))));
            let record = ctx.wrap_fn(|(_source,): (SharedSource<I>,)| {
                Ok::<_, Infallible>(Rc::new(RefCell::new(Vec::new())))
            });
            Rc::new(ReplayInner { source, record })
        });
        Self { inner }
    }

    /// Replay a fresh closure. Keep the returned handle; replaying another
    /// closure starts from a new source.
    pub fn from_fn<F>(ctx: &Recall, func: F) -> Self
    where
        F: Fn(A) -> I + 'static,
    {
        Self::new(ctx, Rc::new(func))
    }

    /// A new cursor over the sequence for `args`
    pub fn call(&self, args: A) -> ReplayCursor<I> {
        let source = self.inner.source.call(args).unwrap_or_else(|never| match never {});
        let steps = self
            .inner
            .record
            .call((Rc::clone(&source),))
            .unwrap_or_else(|never| match never {});
        ReplayCursor::new(source, steps)
    }
}

impl<A, I: Iterator> Replay<A, I> {
    /// Check if both handles replay the same function
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<A, I: Iterator> Clone for Replay<A, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A, I: Iterator> fmt::Debug for Replay<A, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replay")
            .field("source", &self.inner.source)
            .finish_non_exhaustive()
    }
}
