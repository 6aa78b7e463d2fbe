//! Subscriptions - Ordered cleanup lists.
//!
//! Setup code appends cleanups as it acquires resources; teardown runs them
//! newest-first so dependents go before what they depend on. A failing
//! cleanup never stops the rest.

use crate::error::{Result, TeardownError};
use crate::reactive::Effect;

/// A single cleanup. Returning `Err` is the cleanup's way of failing.
pub type Unsubscribe = Box<dyn FnOnce() -> Result<()>>;

#[derive(Default)]
pub struct Subscriptions {
    cleanups: Vec<Unsubscribe>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, cleanup: impl FnOnce() + 'static) {
        self.cleanups.push(Box::new(move || {
            cleanup();
            Ok(())
        }));
    }

    pub fn register_fallible(&mut self, cleanup: impl FnOnce() -> Result<()> + 'static) {
        self.cleanups.push(Box::new(cleanup));
    }

    /// Dispose `effect` on release.
    pub fn register_effect(&mut self, effect: Effect) {
        self.register(move || effect.dispose());
    }

    pub fn register_all(&mut self, cleanups: impl IntoIterator<Item = Unsubscribe>) {
        self.cleanups.extend(cleanups);
    }

    pub fn len(&self) -> usize {
        self.cleanups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cleanups.is_empty()
    }

    /// Run every cleanup in reverse registration order.
    ///
    /// Consumes the list; a fresh one is needed for the next setup.
    pub fn release_all(mut self) -> std::result::Result<(), TeardownError> {
        self.release()
    }

    fn release(&mut self) -> std::result::Result<(), TeardownError> {
        let mut failures = Vec::new();
        while let Some(cleanup) = self.cleanups.pop() {
            if let Err(error) = cleanup() {
                failures.push(error);
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TeardownError::new(failures))
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        if self.cleanups.is_empty() {
            return;
        }
        tracing::warn!(count = self.cleanups.len(), "subscriptions dropped without release");
        if let Err(error) = self.release() {
            tracing::warn!(%error, "cleanup failed while dropping subscriptions");
        }
    }
}

impl std::fmt::Debug for Subscriptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriptions")
            .field("len", &self.cleanups.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UikitError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_release_runs_in_reverse_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Subscriptions::new();
        for name in ["geometry", "material", "listener"] {
            let log = log.clone();
            subs.register(move || log.borrow_mut().push(name));
        }
        assert_eq!(subs.len(), 3);

        subs.release_all().unwrap();
        assert_eq!(*log.borrow(), vec!["listener", "material", "geometry"]);
    }

    #[test]
    fn test_empty_release_is_noop() {
        assert!(Subscriptions::new().release_all().is_ok());
    }

    #[test]
    fn test_failures_are_isolated_and_aggregated() {
        let ran = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Subscriptions::new();

        let r = ran.clone();
        subs.register(move || r.borrow_mut().push(1));
        subs.register_fallible(|| Err(UikitError::cleanup("first")));
        let r = ran.clone();
        subs.register(move || r.borrow_mut().push(3));
        subs.register_fallible(|| Err(UikitError::cleanup("second")));

        let err = subs.release_all().unwrap_err();
        assert_eq!(err.failures().len(), 2);
        assert_eq!(*ran.borrow(), vec![3, 1]);
    }

    #[test]
    fn test_drop_releases_leftovers() {
        let ran = Rc::new(RefCell::new(false));
        {
            let mut subs = Subscriptions::new();
            let r = ran.clone();
            subs.register(move || *r.borrow_mut() = true);
        }
        assert!(*ran.borrow());
    }

    #[test]
    fn test_register_all_accepts_boxed_cleanups() {
        let count = Rc::new(RefCell::new(0));
        let cleanups: Vec<Unsubscribe> = (0..3)
            .map(|_| {
                let c = count.clone();
                Box::new(move || {
                    *c.borrow_mut() += 1;
                    Ok(())
                }) as Unsubscribe
            })
            .collect();

        let mut subs = Subscriptions::new();
        subs.register_all(cleanups);
        subs.release_all().unwrap();
        assert_eq!(*count.borrow(), 3);
    }
}
