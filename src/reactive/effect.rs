//! Effect - Side effects that re-run when the signals they read change.
//!
//! An effect runs once on creation. Every signal it reads during a run
//! becomes a dependency; a write to any of them queues the effect again.
//! Before each re-run (and on dispose) the cleanup returned by the previous
//! run is called and the previous dependencies are dropped.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::Result;
use super::runtime;
use super::signal::AnySource;

// =============================================================================
// Types
// =============================================================================

/// Cleanup returned by an effect run, called before the next run.
pub type CleanupFn = Box<dyn FnOnce()>;

/// Effect body. Errors are routed to the enclosing `try_batch` scope.
pub type EffectFn = Box<dyn FnMut() -> Result<Option<CleanupFn>>>;

bitflags::bitflags! {
    /// Scheduling state of an effect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EffectFlags: u8 {
        const DIRTY = 1 << 0;
        const QUEUED = 1 << 1;
        const RUNNING = 1 << 2;
        const DESTROYED = 1 << 3;
    }
}

// =============================================================================
// Effect Inner
// =============================================================================

pub(crate) struct EffectInner {
    flags: Cell<EffectFlags>,
    func: RefCell<Option<EffectFn>>,
    sources: RefCell<Vec<Rc<dyn AnySource>>>,
    cleanup: RefCell<Option<CleanupFn>>,
    self_weak: Weak<EffectInner>,
}

impl EffectInner {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            flags: Cell::new(EffectFlags::empty()),
            func: RefCell::new(None),
            sources: RefCell::new(Vec::new()),
            cleanup: RefCell::new(None),
            self_weak: weak.clone(),
        })
    }

    pub(crate) fn flags(&self) -> EffectFlags {
        self.flags.get()
    }

    fn insert_flags(&self, flags: EffectFlags) {
        self.flags.set(self.flags.get() | flags);
    }

    fn remove_flags(&self, flags: EffectFlags) {
        self.flags.set(self.flags.get() - flags);
    }

    pub(crate) fn add_source(&self, source: Rc<dyn AnySource>) {
        self.sources.borrow_mut().push(source);
    }

    /// Mark dirty. Returns true when the caller must enqueue the effect.
    pub(crate) fn mark_dirty(&self) -> bool {
        let flags = self.flags();
        if flags.contains(EffectFlags::DESTROYED) {
            return false;
        }
        self.insert_flags(EffectFlags::DIRTY);
        if flags.contains(EffectFlags::QUEUED) {
            return false;
        }
        self.insert_flags(EffectFlags::QUEUED);
        true
    }

    pub(crate) fn clear_queued(&self) {
        self.remove_flags(EffectFlags::QUEUED | EffectFlags::DIRTY);
    }

    fn release_sources(&self) {
        let sources = std::mem::take(&mut *self.sources.borrow_mut());
        for source in sources {
            source.unsubscribe(&self.self_weak);
        }
    }

    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    /// Run `f` with this effect collecting dependencies.
    pub(crate) fn track_with<R>(self: &Rc<Self>, f: impl FnOnce() -> R) -> R {
        runtime::with_observer(Some(self.clone()), f)
    }

    pub(crate) fn install(&self, func: EffectFn) {
        *self.func.borrow_mut() = Some(func);
    }

    /// Re-run the effect body.
    pub(crate) fn run(self: &Rc<Self>) {
        if self.flags().contains(EffectFlags::DESTROYED) {
            return;
        }
        self.remove_flags(EffectFlags::DIRTY | EffectFlags::QUEUED);
        self.insert_flags(EffectFlags::RUNNING);

        self.run_cleanup();
        self.release_sources();

        // Taken out for the duration of the call so a dispose from inside the
        // body does not hit a live borrow.
        let mut func = self.func.borrow_mut().take();
        let outcome = match func.as_mut() {
            Some(func) => self.track_with(func),
            None => Ok(None),
        };
        self.remove_flags(EffectFlags::RUNNING);

        if self.flags().contains(EffectFlags::DESTROYED) {
            self.release_sources();
            drop(func);
            if let Ok(Some(cleanup)) = outcome {
                cleanup();
            }
            return;
        }
        *self.func.borrow_mut() = func;

        match outcome {
            Ok(cleanup) => *self.cleanup.borrow_mut() = cleanup,
            Err(error) => runtime::report(error),
        }
    }

    pub(crate) fn dispose(&self) {
        if self.flags().contains(EffectFlags::DESTROYED) {
            return;
        }
        self.insert_flags(EffectFlags::DESTROYED);
        self.release_sources();
        let func = self.func.borrow_mut().take();
        drop(func);
        self.run_cleanup();
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.get_mut().take() {
            cleanup();
        }
    }
}

// =============================================================================
// Effect Handle
// =============================================================================

/// Handle to a running effect.
///
/// The effect lives as long as a handle does. Dropping the last handle stops
/// it and runs its pending cleanup; `dispose` does the same explicitly.
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    pub(crate) fn from_inner(inner: Rc<EffectInner>) -> Self {
        Self { inner }
    }

    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.flags().contains(EffectFlags::DESTROYED)
    }

    pub fn flags(&self) -> EffectFlags {
        self.inner.flags()
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect").field("flags", &self.inner.flags()).finish()
    }
}

// =============================================================================
// Creation
// =============================================================================

/// Create an effect whose body may fail and may return a cleanup.
///
/// The first run happens immediately inside a batch, so writes it performs
/// are flushed after it returns.
pub fn try_effect<F>(func: F) -> Effect
where
    F: FnMut() -> Result<Option<CleanupFn>> + 'static,
{
    let inner = EffectInner::new();
    inner.install(Box::new(func));
    {
        let _batch = runtime::enter_batch();
        inner.run();
    }
    runtime::flush();
    Effect::from_inner(inner)
}

/// Create an effect that returns a cleanup.
pub fn effect_with_cleanup<F>(mut func: F) -> Effect
where
    F: FnMut() -> Option<CleanupFn> + 'static,
{
    try_effect(move || Ok(func()))
}

/// Create an effect.
pub fn effect<F>(mut func: F) -> Effect
where
    F: FnMut() + 'static,
{
    try_effect(move || {
        func();
        Ok(None)
    })
}
