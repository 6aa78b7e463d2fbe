//! Memo - A derived, read-only cell.
//!
//! Recomputed eagerly by an internal effect whenever a dependency changes.
//! Dependents are notified only when the new value differs under the memo's
//! equality.

use std::fmt;

use super::effect::{Effect, EffectInner};
use super::signal::{signal_with_equals, EqualsFn, ReadSignal};

pub struct Memo<T> {
    value: ReadSignal<T>,
    effect: Effect,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T: 'static> Memo<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.get()
    }

    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.value.peek()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    pub fn read_only(&self) -> ReadSignal<T> {
        self.value.clone()
    }

    /// Stop recomputing. The last value stays readable.
    pub fn dispose(&self) {
        self.effect.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.effect.is_disposed()
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("value", &self.value)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Create a memo compared with `PartialEq`.
pub fn memo<T, F>(compute: F) -> Memo<T>
where
    T: PartialEq + 'static,
    F: FnMut() -> T + 'static,
{
    memo_with_equals(compute, |a, b| a == b)
}

/// Create a memo with a custom change test.
pub fn memo_with_equals<T, F>(mut compute: F, equals: EqualsFn<T>) -> Memo<T>
where
    T: 'static,
    F: FnMut() -> T + 'static,
{
    let inner = EffectInner::new();
    let initial = inner.track_with(&mut compute);
    let value = signal_with_equals(initial, equals);

    let writer = value.clone();
    inner.install(Box::new(move || {
        writer.set(compute());
        Ok(None)
    }));

    Memo {
        value: value.read_only(),
        effect: Effect::from_inner(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{effect, signal};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_memo_follows_sources() {
        let width = signal(2);
        let height = signal(3);
        let (w, h) = (width.clone(), height.clone());
        let area = memo(move || w.get() * h.get());

        assert_eq!(area.get(), 6);
        height.set(10);
        assert_eq!(area.get(), 20);
    }

    #[test]
    fn test_equal_result_does_not_notify() {
        let value = signal(4);
        let v = value.clone();
        let parity = memo(move || v.get() % 2);

        let runs = Rc::new(Cell::new(0));
        let (p, r) = (parity.clone(), runs.clone());
        let _watch = effect(move || {
            p.get();
            r.set(r.get() + 1);
        });

        value.set(6);
        assert_eq!(runs.get(), 1);
        value.set(7);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_disposed_memo_freezes() {
        let source = signal(1);
        let s = source.clone();
        let doubled = memo(move || s.get() * 2);
        doubled.dispose();
        source.set(5);
        assert_eq!(doubled.peek(), 2);
    }
}
