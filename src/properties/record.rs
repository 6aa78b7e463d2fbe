//! Property records - Ordered key/value sets with opaque values.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::reactive::{identity_equals, signal_with_equals, Signal};
use crate::state::events::EventHandler;

// =============================================================================
// Property Value
// =============================================================================

/// A property value. The merge engine never interprets these; components
/// read them back with the `as_*` accessors.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    /// Nested record. Expanded by the merge engine when its key is a
    /// registered conditional, opaque otherwise.
    Record(Rc<PropertyRecord>),
    Handler(EventHandler),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Rc<PropertyRecord>> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Self::Handler(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<PropertyRecord> for PropertyValue {
    fn from(value: PropertyRecord) -> Self {
        Self::Record(Rc::new(value))
    }
}

impl From<EventHandler> for PropertyValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}

// =============================================================================
// Property Record
// =============================================================================

/// Insertion-ordered property map.
///
/// ```ignore
/// let style = PropertyRecord::new()
///     .with("backgroundColor", "red")
///     .with("hover", PropertyRecord::new().with("backgroundColor", "blue"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyRecord {
    entries: IndexMap<Rc<str>, PropertyValue>,
}

impl PropertyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or overwrite. An overwritten key keeps its position.
    pub fn insert(&mut self, key: &str, value: impl Into<PropertyValue>) {
        self.entries.insert(Rc::from(key), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &PropertyValue)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|key| &**key)
    }

    /// Shallow merge: `other` wins on shared keys, new keys are appended.
    pub fn merged_with(&self, other: &PropertyRecord) -> PropertyRecord {
        let mut merged = self.clone();
        for (key, value) in other.iter() {
            merged.entries.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl<K, V> FromIterator<(K, V)> for PropertyRecord
where
    K: AsRef<str>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = PropertyRecord::new();
        for (key, value) in iter {
            record.insert(key.as_ref(), value);
        }
        record
    }
}

/// Build a [`PropertyRecord`] from `key => value` pairs.
///
/// ```ignore
/// let style = record! { "color" => "red", "opacity" => 0.5 };
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::properties::PropertyRecord::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::properties::PropertyRecord::new()$(.with($key, $value))+
    };
}

// =============================================================================
// Record Cells
// =============================================================================

/// Reactive slot for one input record. Writes compare by identity, so every
/// new record counts as a change.
pub type RecordCell = Signal<Option<Rc<PropertyRecord>>>;

pub fn record_cell(initial: Option<PropertyRecord>) -> RecordCell {
    signal_with_equals(initial.map(Rc::new), identity_equals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_position() {
        let mut record = PropertyRecord::new().with("a", 1).with("b", 2);
        record.insert("a", 3);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&PropertyValue::Number(3.0)));
    }

    #[test]
    fn test_shallow_merge() {
        let base = PropertyRecord::new()
            .with("color", "red")
            .with("hover", PropertyRecord::new().with("color", "blue"));
        let patch = PropertyRecord::new()
            .with("hover", PropertyRecord::new().with("opacity", 0.5))
            .with("padding", 4);

        let merged = base.merged_with(&patch);
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["color", "hover", "padding"]);
        // Shallow: the nested record is replaced, not merged.
        let hover = merged.get("hover").and_then(PropertyValue::as_record).unwrap();
        assert!(!hover.contains_key("color"));
    }

    #[test]
    fn test_record_macro_and_from_iter() {
        let a = record! { "color" => "red", "opacity" => 0.5 };
        let b: PropertyRecord = [("color", PropertyValue::from("red")), ("opacity", 0.5.into())]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert!(record! {}.is_empty());
    }

    #[test]
    fn test_record_cell_compares_identity() {
        let cell = record_cell(Some(record! { "color" => "red" }));
        let same_content = Some(Rc::new(record! { "color" => "red" }));
        assert!(cell.set(same_content));
        assert!(!cell.set(cell.peek()));
    }
}
