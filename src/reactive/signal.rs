//! Signal - The writable reactive cell.
//!
//! Reading a signal inside an effect subscribes that effect; writing a
//! changed value marks every subscriber dirty and flushes.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::effect::EffectInner;
use super::runtime;

/// Equality used to decide whether a write is a change.
pub type EqualsFn<T> = fn(&T, &T) -> bool;

// =============================================================================
// Source Plumbing
// =============================================================================

/// Type-erased view of a signal, held by the effects that read it.
pub(crate) trait AnySource {
    fn unsubscribe(&self, effect: &Weak<EffectInner>);
}

pub(crate) struct SignalInner<T> {
    value: RefCell<T>,
    equals: EqualsFn<T>,
    subscribers: RefCell<Vec<Weak<EffectInner>>>,
}

impl<T: 'static> SignalInner<T> {
    fn new(value: T, equals: EqualsFn<T>) -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(value),
            equals,
            subscribers: RefCell::new(Vec::new()),
        })
    }

    fn track(self: &Rc<Self>) {
        let Some(observer) = runtime::current_observer() else {
            return;
        };
        let weak = Rc::downgrade(&observer);
        let subscribed = {
            let mut subscribers = self.subscribers.borrow_mut();
            if subscribers.iter().any(|s| Weak::ptr_eq(s, &weak)) {
                false
            } else {
                subscribers.push(weak);
                true
            }
        };
        if subscribed {
            observer.add_source(self.clone() as Rc<dyn AnySource>);
        }
    }

    fn notify(&self) {
        let subscribers: Vec<Rc<EffectInner>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|s| s.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for effect in subscribers {
            if effect.mark_dirty() {
                runtime::enqueue(Rc::downgrade(&effect));
            }
        }
        runtime::flush();
    }

    fn set(&self, value: T) -> bool {
        let changed = {
            let mut current = self.value.borrow_mut();
            if (self.equals)(&current, &value) {
                false
            } else {
                *current = value;
                true
            }
        };
        if changed {
            self.notify();
        }
        changed
    }
}

impl<T> AnySource for SignalInner<T> {
    fn unsubscribe(&self, effect: &Weak<EffectInner>) {
        self.subscribers
            .borrow_mut()
            .retain(|s| !Weak::ptr_eq(s, effect));
    }
}

// =============================================================================
// Signal<T>
// =============================================================================

/// A writable reactive cell.
///
/// ```ignore
/// let count = signal(0);
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Signal<T> {
    /// Tracked read.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.track();
        self.inner.value.borrow().clone()
    }

    /// Untracked read.
    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Tracked read through a borrow.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.track();
        f(&self.inner.value.borrow())
    }

    /// Write a value. Returns false (and notifies nobody) when it equals the
    /// current one.
    pub fn set(&self, value: T) -> bool {
        self.inner.set(value)
    }

    /// Mutate in place. Always notifies.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.inner.notify();
    }

    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            inner: self.inner.clone(),
        }
    }

    /// True when both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// =============================================================================
// ReadSignal<T>
// =============================================================================

/// Read-only handle to a signal. Handed to code that may observe a cell but
/// must not write it.
pub struct ReadSignal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> ReadSignal<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.track();
        self.inner.value.borrow().clone()
    }

    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.track();
        f(&self.inner.value.borrow())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> From<Signal<T>> for ReadSignal<T> {
    fn from(signal: Signal<T>) -> Self {
        ReadSignal {
            inner: signal.inner,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSignal")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// =============================================================================
// Creation
// =============================================================================

/// Create a signal compared with `PartialEq`.
pub fn signal<T: PartialEq + 'static>(value: T) -> Signal<T> {
    signal_with_equals(value, |a, b| a == b)
}

/// Create a signal with a custom change test.
pub fn signal_with_equals<T: 'static>(value: T, equals: EqualsFn<T>) -> Signal<T> {
    Signal {
        inner: SignalInner::new(value, equals),
    }
}

/// Equality by allocation identity, for cells holding shared immutable values.
pub fn identity_equals<T>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let count = signal(1);
        assert!(!count.set(1));
        assert!(count.set(2));
        assert_eq!(count.peek(), 2);
    }

    #[test]
    fn test_identity_equals_ignores_structural_equality() {
        let a = Rc::new(String::from("red"));
        let b = Rc::new(String::from("red"));
        assert!(identity_equals(&Some(a.clone()), &Some(a.clone())));
        assert!(!identity_equals(&Some(a), &Some(b)));
        assert!(identity_equals::<String>(&None, &None));
    }

    #[test]
    fn test_read_only_shares_cell() {
        let name = signal(String::from("a"));
        let view = name.read_only();
        name.set(String::from("b"));
        assert_eq!(view.peek(), "b");
    }
}
