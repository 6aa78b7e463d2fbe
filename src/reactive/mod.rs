//! Reactive Core - Signals, effects and memos.
//!
//! A minimal fine-grained dependency tracker:
//! - [`Signal`] - writable cell; reads inside an effect subscribe it
//! - [`effect`] / [`try_effect`] - re-run when a dependency changes
//! - [`memo`] - derived read-only cell, recomputed eagerly
//! - [`batch`] / [`try_batch`] - group writes into one flush
//! - [`untrack`] - read without subscribing
//!
//! Everything is single-threaded. A write flushes synchronously: dependent
//! effects run in FIFO order before `set` returns, unless a batch is open or
//! a flush is already running, in which case the outermost caller drains
//! the queue.
//!
//! # Example
//!
//! ```ignore
//! use spark_uikit::reactive::{signal, memo, effect};
//!
//! let count = signal(1);
//! let c = count.clone();
//! let doubled = memo(move || c.get() * 2);
//!
//! let d = doubled.clone();
//! let _log = effect(move || println!("doubled = {}", d.get()));
//!
//! count.set(2); // prints "doubled = 4"
//! ```

mod effect;
mod memo;
mod runtime;
mod signal;

pub use effect::{effect, effect_with_cleanup, try_effect, CleanupFn, Effect, EffectFlags, EffectFn};
pub use memo::{memo, memo_with_equals, Memo};
pub use runtime::MAX_FLUSH_RUNS;
pub use signal::{identity_equals, signal, signal_with_equals, EqualsFn, ReadSignal, Signal};

use crate::error::Result;

// =============================================================================
// Batching
// =============================================================================

/// Run `f` with flushing deferred until the outermost batch ends.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let result = {
        let _batch = runtime::enter_batch();
        f()
    };
    runtime::flush();
    result
}

/// Like [`batch`], but returns the first error raised by an effect during
/// the flush.
///
/// Further errors from the same flush are logged and dropped. When called
/// while an outer flush is already running, effects queued here run later,
/// and their errors go to the scope that is open at that point.
pub fn try_batch<R>(f: impl FnOnce() -> R) -> Result<R> {
    let scope = runtime::ErrorScope::open();
    let result = batch(f);
    let mut errors = scope.close().into_iter();
    match errors.next() {
        None => Ok(result),
        Some(first) => {
            for extra in errors {
                tracing::warn!(error = %extra, "additional effect error in the same flush");
            }
            Err(first)
        }
    }
}

/// Run `f` without recording dependencies on the current effect.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    runtime::with_observer(None, f)
}

/// Hand `error` to the innermost [`try_batch`] scope, or log it when there
/// is none. For failures that must not abort the effect reporting them.
pub(crate) fn report_error(error: crate::error::UikitError) {
    runtime::report(error);
}

/// True while writes are being deferred by [`batch`] or a running flush.
pub fn is_deferring() -> bool {
    runtime::is_batching() || runtime::is_flushing()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_batch_coalesces_runs() {
        let a = signal(0);
        let b = signal(0);
        let runs = Rc::new(Cell::new(0));
        let (a2, b2, r) = (a.clone(), b.clone(), runs.clone());
        let _sum = effect(move || {
            a2.get();
            b2.get();
            r.set(r.get() + 1);
        });

        batch(|| {
            assert!(is_deferring());
            a.set(1);
            b.set(2);
        });
        assert_eq!(runs.get(), 2);
        assert!(!is_deferring());
    }

    #[test]
    fn test_untrack_skips_dependency() {
        let tracked = signal(0);
        let ignored = signal(0);
        let runs = Rc::new(Cell::new(0));
        let (t, i, r) = (tracked.clone(), ignored.clone(), runs.clone());
        let _e = effect(move || {
            t.get();
            untrack(|| i.get());
            r.set(r.get() + 1);
        });

        ignored.set(5);
        assert_eq!(runs.get(), 1);
        tracked.set(5);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_try_batch_ok_without_errors() {
        let value = signal(1);
        assert_eq!(try_batch(|| value.set(2)).ok(), Some(true));
    }
}
