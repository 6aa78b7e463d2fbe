//! Reactive Runtime - Thread-local scheduling state.
//!
//! Holds everything the signal graph needs that is not owned by a single
//! signal or effect:
//! - the observer stack (which effect is currently collecting dependencies)
//! - the FIFO queue of effects waiting to re-run
//! - batch depth and the flushing flag (no re-entrant flush)
//! - the error sink used by `try_batch` scopes

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::error::UikitError;
use super::effect::EffectInner;

/// Upper bound on effect runs within one flush before it is aborted.
pub const MAX_FLUSH_RUNS: usize = 100_000;

// =============================================================================
// Runtime State
// =============================================================================

struct Runtime {
    /// `None` entries come from `untrack` and suppress tracking.
    observers: RefCell<Vec<Option<Rc<EffectInner>>>>,
    queue: RefCell<VecDeque<Weak<EffectInner>>>,
    batch_depth: Cell<u32>,
    flushing: Cell<bool>,
    error_scopes: Cell<u32>,
    errors: RefCell<Vec<UikitError>>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            observers: RefCell::new(Vec::new()),
            queue: RefCell::new(VecDeque::new()),
            batch_depth: Cell::new(0),
            flushing: Cell::new(false),
            error_scopes: Cell::new(0),
            errors: RefCell::new(Vec::new()),
        }
    }
}

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

// =============================================================================
// Observer Stack
// =============================================================================

pub(crate) fn current_observer() -> Option<Rc<EffectInner>> {
    RUNTIME.with(|rt| rt.observers.borrow().last().cloned().flatten())
}

struct ObserverGuard;

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        RUNTIME.with(|rt| {
            rt.observers.borrow_mut().pop();
        });
    }
}

/// Run `f` with `observer` on top of the observer stack.
pub(crate) fn with_observer<R>(observer: Option<Rc<EffectInner>>, f: impl FnOnce() -> R) -> R {
    RUNTIME.with(|rt| rt.observers.borrow_mut().push(observer));
    let _guard = ObserverGuard;
    f()
}

// =============================================================================
// Queue + Flush
// =============================================================================

pub(crate) fn enqueue(effect: Weak<EffectInner>) {
    RUNTIME.with(|rt| rt.queue.borrow_mut().push_back(effect));
}

pub(crate) struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        RUNTIME.with(|rt| rt.batch_depth.set(rt.batch_depth.get().saturating_sub(1)));
    }
}

pub(crate) fn enter_batch() -> BatchGuard {
    RUNTIME.with(|rt| rt.batch_depth.set(rt.batch_depth.get() + 1));
    BatchGuard
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        RUNTIME.with(|rt| rt.flushing.set(false));
    }
}

/// Run queued effects until the queue is empty.
///
/// No-op while a batch is open or a flush is already in progress; the
/// outermost caller drains everything queued in the meantime.
pub(crate) fn flush() {
    let idle = RUNTIME.with(|rt| !rt.flushing.get() && rt.batch_depth.get() == 0);
    if !idle {
        return;
    }
    RUNTIME.with(|rt| rt.flushing.set(true));
    let _guard = FlushGuard;

    let mut runs = 0usize;
    loop {
        let next = RUNTIME.with(|rt| rt.queue.borrow_mut().pop_front());
        let Some(weak) = next else { break };
        let Some(effect) = weak.upgrade() else { continue };

        runs += 1;
        if runs > MAX_FLUSH_RUNS {
            let abandoned: Vec<_> = RUNTIME.with(|rt| rt.queue.borrow_mut().drain(..).collect());
            effect.clear_queued();
            for weak in abandoned {
                if let Some(effect) = weak.upgrade() {
                    effect.clear_queued();
                }
            }
            report(UikitError::RunawayFlush { runs: MAX_FLUSH_RUNS });
            break;
        }
        effect.run();
    }

    if runs > 0 {
        tracing::trace!(runs, "reactive flush complete");
    }
}

// =============================================================================
// Batching
// =============================================================================

pub(crate) fn is_batching() -> bool {
    RUNTIME.with(|rt| rt.batch_depth.get() > 0)
}

pub(crate) fn is_flushing() -> bool {
    RUNTIME.with(|rt| rt.flushing.get())
}

// =============================================================================
// Error Sink
// =============================================================================

/// Hand an effect error to the innermost `try_batch` scope.
///
/// Outside of any scope there is nobody to return it to, so it is logged.
pub(crate) fn report(error: UikitError) {
    let scoped = RUNTIME.with(|rt| rt.error_scopes.get() > 0);
    if scoped {
        RUNTIME.with(|rt| rt.errors.borrow_mut().push(error));
    } else {
        tracing::error!(%error, "effect failed outside of an error scope");
    }
}

pub(crate) struct ErrorScope {
    mark: usize,
    closed: bool,
}

impl ErrorScope {
    pub(crate) fn open() -> Self {
        RUNTIME.with(|rt| {
            rt.error_scopes.set(rt.error_scopes.get() + 1);
            Self {
                mark: rt.errors.borrow().len(),
                closed: false,
            }
        })
    }

    /// Close the scope and take the errors raised since it was opened.
    pub(crate) fn close(mut self) -> Vec<UikitError> {
        self.closed = true;
        RUNTIME.with(|rt| {
            rt.error_scopes.set(rt.error_scopes.get().saturating_sub(1));
            let mut errors = rt.errors.borrow_mut();
            let mark = self.mark.min(errors.len());
            errors.drain(mark..).collect()
        })
    }
}

impl Drop for ErrorScope {
    fn drop(&mut self) {
        if !self.closed {
            RUNTIME.with(|rt| rt.error_scopes.set(rt.error_scopes.get().saturating_sub(1)));
        }
    }
}
