//! Recall Sequence Replay
//!
//! Memoizes functions that return iterators. All cursors for the same
//! arguments read from one source iterator, which is advanced lazily and
//! at most once per position no matter how many cursors read it.
//!
//! ```
//! use recall_memo::Recall;
//! use recall_replay::Replay;
//!
//! let ctx = Recall::new();
//! let evens = Replay::from_fn(&ctx, |(n,): (u32,)| (0..n).filter(|x| x % 2 == 0));
//! let mut a = evens.call((6,));
//! let b = evens.call((6,));
//! assert_eq!(a.next(), Some(0));
//! assert_eq!(b.collect::<Vec<_>>(), vec![0, 2, 4]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod error;
pub mod replay;

pub use cursor::ReplayCursor;
pub use error::{ReplayError, ReplayResult};
pub use replay::Replay;

use recall_core::KeyArgs;
use std::rc::Rc;

/// Replay `func` in the default context of the current thread
pub fn replay<A, I, F>(func: Rc<F>) -> Replay<A, I>
where
    A: KeyArgs + 'static,
    I: Iterator + 'static,
    I::Item: Clone + 'static,
    F: Fn(A) -> I + 'static,
{
    Replay::new(&recall_memo::global(), func)
}
