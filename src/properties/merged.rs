//! Merged Properties - Precedence resolution over a stack of records.
//!
//! Inputs are ordered lowest priority first. Each record's entries are
//! flattened, in order, into per-key candidate lists; a read walks the list
//! for its key from the end and returns the first candidate whose gates are
//! all open.
//!
//! # Conditional records
//!
//! A component registers conditional keys, each with a boolean trigger
//! cell (`hover` → hovered, `active` → pressed). An entry whose key is a
//! registered conditional and whose value is a nested record is expanded at
//! the entry's position, its candidates gated on the trigger. Nesting
//! stacks gates. Any other entry is an opaque value, nested records
//! included.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::reactive::{memo_with_equals, Memo, ReadSignal};
use super::record::{PropertyRecord, PropertyValue};

// =============================================================================
// Conditionals
// =============================================================================

#[derive(Clone, Default)]
pub struct Conditionals {
    triggers: IndexMap<Rc<str>, ReadSignal<bool>>,
}

impl Conditionals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, trigger: ReadSignal<bool>) -> Self {
        self.triggers.insert(Rc::from(key), trigger);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ReadSignal<bool>> {
        self.triggers.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

impl fmt::Debug for Conditionals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.triggers.keys()).finish()
    }
}

// =============================================================================
// Merged View
// =============================================================================

struct Candidate {
    value: PropertyValue,
    gates: Vec<ReadSignal<bool>>,
}

/// Immutable, precedence-ordered property lookup.
#[derive(Default)]
pub struct MergedProperties {
    candidates: IndexMap<Rc<str>, Vec<Candidate>>,
}

impl MergedProperties {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Flatten `records`, lowest priority first. `None` slots are skipped.
    pub fn from_records(conditionals: &Conditionals, records: &[Option<Rc<PropertyRecord>>]) -> Self {
        let mut merged = Self::default();
        for record in records.iter().flatten() {
            merged.add_record(conditionals, record, &[]);
        }
        merged
    }

    fn add_record(&mut self, conditionals: &Conditionals, record: &PropertyRecord, gates: &[ReadSignal<bool>]) {
        for (key, value) in record.iter() {
            match (conditionals.get(key), value) {
                (Some(trigger), PropertyValue::Record(nested)) => {
                    let mut nested_gates = gates.to_vec();
                    nested_gates.push(trigger.clone());
                    self.add_record(conditionals, nested, &nested_gates);
                }
                _ => self.candidates.entry(key.clone()).or_default().push(Candidate {
                    value: value.clone(),
                    gates: gates.to_vec(),
                }),
            }
        }
    }

    /// Highest-priority value for `key` whose conditions hold, else `fallback`.
    ///
    /// Trigger cells consulted on the way are tracked, so an effect calling
    /// this re-runs when a relevant condition flips.
    pub fn read(&self, key: &str, fallback: Option<PropertyValue>) -> Option<PropertyValue> {
        let Some(candidates) = self.candidates.get(key) else {
            return fallback;
        };
        candidates
            .iter()
            .rev()
            .find(|candidate| candidate.gates.iter().all(ReadSignal::get))
            .map(|candidate| candidate.value.clone())
            .or(fallback)
    }

    pub fn read_number(&self, key: &str, fallback: f64) -> f64 {
        self.read(key, None)
            .and_then(|value| value.as_number())
            .unwrap_or(fallback)
    }

    pub fn read_text(&self, key: &str) -> Option<Rc<str>> {
        match self.read(key, None) {
            Some(PropertyValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Keys with at least one candidate, in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.candidates.keys().map(|key| &**key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.candidates.contains_key(key)
    }
}

impl fmt::Debug for MergedProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.candidates
                    .iter()
                    .map(|(key, list)| (key, list.iter().map(|c| &c.value).collect::<Vec<_>>())),
            )
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Merge reactive record inputs, lowest priority first.
///
/// The view is rebuilt, as a new instance, whenever any input cell changes;
/// trigger flips do not rebuild it, they only change what `read` returns.
pub fn build_merged(
    conditionals: Conditionals,
    records: Vec<ReadSignal<Option<Rc<PropertyRecord>>>>,
) -> Memo<Rc<MergedProperties>> {
    memo_with_equals(
        move || {
            let snapshot: Vec<_> = records.iter().map(ReadSignal::get).collect();
            Rc::new(MergedProperties::from_records(&conditionals, &snapshot))
        },
        |a, b| Rc::ptr_eq(a, b),
    )
}
