//! Independent read positions over a shared, lazily produced sequence.

use crate::error::{ReplayError, ReplayResult};
use std::cell::RefCell;
use std::iter::FusedIterator;
use std::rc::Rc;

/// Source iterator shared by every cursor of one call
pub(crate) type SharedSource<I> = Rc<RefCell<I>>;

/// Items produced so far; `None` marks the end of the sequence.
pub(crate) type SharedSteps<T> = Rc<RefCell<Vec<Option<T>>>>;

/// A cursor over a replayed sequence.
///
/// Positions already produced are read back from the shared steps. Only a
/// cursor that reaches past the end of the steps advances the source, and
/// it records what it got so that no other cursor has to.
pub struct ReplayCursor<I: Iterator> {
    source: SharedSource<I>,
    steps: SharedSteps<I::Item>,
    position: usize,
    done: bool,
}

impl<I> ReplayCursor<I>
where
    I: Iterator,
    I::Item: Clone,
{
    pub(crate) fn new(source: SharedSource<I>, steps: SharedSteps<I::Item>) -> Self {
        Self {
            source,
            steps,
            position: 0,
            done: false,
        }
    }

    /// Number of items this cursor has yielded
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Check if this cursor has seen the end of the sequence
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Number of steps produced so far, across all cursors
    #[must_use]
    pub fn produced(&self) -> usize {
        self.steps.borrow().len()
    }

    /// Next item, advancing the shared source only if no cursor has read
    /// this position yet.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::AlreadyRunning`] when called from inside the
    /// source's own `next` for the same sequence.
    pub fn try_next(&mut self) -> ReplayResult<Option<I::Item>> {
        if self.done {
            return Ok(None);
        }

        let recorded = self.steps.borrow().get(self.position).cloned();
        if let Some(step) = recorded {
            return Ok(self.observe(step));
        }

        let step = {
            let mut source = self.source.try_borrow_mut().map_err(|_| ReplayError::AlreadyRunning)?;
            source.next()
        };
        tracing::trace!(position = self.position, done = step.is_none(), "advanced replay source");
        self.steps.borrow_mut().push(step.clone());
        Ok(self.observe(step))
    }

    fn observe(&mut self, step: Option<I::Item>) -> Option<I::Item> {
        match step {
            Some(item) => {
                self.position += 1;
                Some(item)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl<I> Iterator for ReplayCursor<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    /// # Panics
    ///
    /// Panics if the source is re-entered; use [`ReplayCursor::try_next`]
    /// to handle that case.
    fn next(&mut self) -> Option<Self::Item> {
        match self.try_next() {
            Ok(item) => item,
            Err(error) => panic!("{error}"),
        }
    }
}

impl<I> FusedIterator for ReplayCursor<I>
where
    I: Iterator,
    I::Item: Clone,
{
}
