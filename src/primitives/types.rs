//! Primitive types - Construction contract between kinds and the binder.
//!
//! A component kind is data: a name plus a construction function. The
//! binder calls the function once per generation with [`ConstructArgs`]
//! and gets back [`Internals`] describing everything that generation owns.

use std::fmt;
use std::rc::Rc;

use crate::engine::{NodeId, Subscriptions};
use crate::error::Result;
use crate::properties::{MergedProperties, PropertyRecord};
use crate::reactive::{memo, Memo, ReadSignal, Signal};
use crate::state::context::Context;
use crate::state::events::{event_name_for_key, EventHandler, EventHandlers};

// =============================================================================
// Prop Value - Reactive property wrapper
// =============================================================================

/// A value that can be static, a signal, or a getter.
///
/// Read inside an effect, signal and getter values keep the effect
/// subscribed to whatever they read.
#[derive(Clone)]
pub enum PropValue<T: Clone + 'static> {
    /// Static value (not reactive).
    Static(T),
    /// Reactive signal (changes propagate automatically).
    Signal(ReadSignal<T>),
    /// Getter function (called each time value is needed).
    Getter(Rc<dyn Fn() -> T>),
}

impl<T: Clone + 'static> PropValue<T> {
    /// Current value. Tracked when called inside an effect.
    pub fn get(&self) -> T {
        match self {
            PropValue::Static(v) => v.clone(),
            PropValue::Signal(s) => s.get(),
            PropValue::Getter(f) => f(),
        }
    }

    pub fn getter(f: impl Fn() -> T + 'static) -> Self {
        PropValue::Getter(Rc::new(f))
    }
}

impl<T: Clone + Default + 'static> Default for PropValue<T> {
    fn default() -> Self {
        PropValue::Static(T::default())
    }
}

impl<T: Clone + 'static> From<T> for PropValue<T> {
    fn from(value: T) -> Self {
        PropValue::Static(value)
    }
}

impl<T: Clone + 'static> From<Signal<T>> for PropValue<T> {
    fn from(signal: Signal<T>) -> Self {
        PropValue::Signal(signal.read_only())
    }
}

impl<T: Clone + 'static> From<ReadSignal<T>> for PropValue<T> {
    fn from(signal: ReadSignal<T>) -> Self {
        PropValue::Signal(signal)
    }
}

impl From<&str> for PropValue<String> {
    fn from(value: &str) -> Self {
        PropValue::Static(value.to_string())
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for PropValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Static(v) => f.debug_tuple("Static").field(v).finish(),
            PropValue::Signal(_) => f.write_str("Signal(..)"),
            PropValue::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Read-only view of one input record cell.
pub type RecordInput = ReadSignal<Option<Rc<PropertyRecord>>>;

/// Inputs a component starts out with, so it can be created already
/// configured.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentInputs {
    pub style: Option<PropertyRecord>,
    pub properties: Option<PropertyRecord>,
    pub defaults: Option<PropertyRecord>,
}

impl ComponentInputs {
    pub fn with_style(mut self, style: PropertyRecord) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_properties(mut self, properties: PropertyRecord) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_defaults(mut self, defaults: PropertyRecord) -> Self {
        self.defaults = Some(defaults);
        self
    }
}

/// What a construction function gets for one generation.
#[derive(Clone)]
pub struct ConstructArgs {
    /// Context resolved from the nearest ancestor.
    pub context: Rc<Context>,
    pub style: RecordInput,
    pub properties: RecordInput,
    pub defaults: RecordInput,
    /// The component's own scene node.
    pub node: NodeId,
}

impl ConstructArgs {
    /// The three inputs, lowest priority first.
    pub fn inputs(&self) -> Vec<RecordInput> {
        vec![
            self.defaults.clone(),
            self.properties.clone(),
            self.style.clone(),
        ]
    }
}

/// Setup step run once per generation. Everything it acquires is
/// registered on the generation's subscription list.
pub type Initializer = Box<dyn FnOnce(&mut Subscriptions) -> Result<()>>;

/// Per-generation output of a construction function.
pub struct Internals {
    pub merged_properties: Memo<Rc<MergedProperties>>,
    pub initializers: Vec<Initializer>,
    /// Bound on the component's node for the generation's lifetime.
    pub handlers: Memo<Rc<EventHandlers>>,
    /// Attached under the component's node, detached on teardown.
    pub nodes: Vec<NodeId>,
    /// Released last, after the nodes are detached. Holds resources the
    /// construction function allocated for this generation only.
    pub resources: Subscriptions,
    /// What this generation provides to children. `None` for leaf kinds.
    pub child_context: Option<Rc<Context>>,
}

impl Internals {
    pub fn new(merged_properties: Memo<Rc<MergedProperties>>, handlers: Memo<Rc<EventHandlers>>) -> Self {
        Self {
            merged_properties,
            initializers: Vec::new(),
            handlers,
            nodes: Vec::new(),
            resources: Subscriptions::new(),
            child_context: None,
        }
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_initializer(mut self, init: impl FnOnce(&mut Subscriptions) -> Result<()> + 'static) -> Self {
        self.initializers.push(Box::new(init));
        self
    }

    pub fn with_resource(mut self, release: impl FnOnce() + 'static) -> Self {
        self.resources.register(release);
        self
    }

    pub fn with_child_context(mut self, context: Rc<Context>) -> Self {
        self.child_context = Some(context);
        self
    }
}

impl fmt::Debug for Internals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Internals")
            .field("initializers", &self.initializers.len())
            .field("nodes", &self.nodes)
            .field("resources", &self.resources.len())
            .field("child_context", &self.child_context.as_ref().map(|c| c.depth))
            .finish()
    }
}

/// Handler set for a generation: the kind's own handlers, then every merged
/// `on<Name>` key holding a handler.
///
/// Recomputed when the merged view or a relevant trigger changes. Equal
/// sets do not notify, so listeners are only reinstalled on a real change.
pub fn event_handlers(
    merged: &Memo<Rc<MergedProperties>>,
    internal: Vec<(&'static str, EventHandler)>,
) -> Memo<Rc<EventHandlers>> {
    let merged = merged.clone();
    let internal: EventHandlers = internal
        .into_iter()
        .map(|(name, handler)| (Rc::from(name), handler))
        .collect();
    memo(move || {
        let view = merged.get();
        let mut handlers = internal.clone();
        for key in view.keys() {
            let Some(name) = event_name_for_key(key) else {
                continue;
            };
            if let Some(handler) = view.read(key, None).as_ref().and_then(|v| v.as_handler()) {
                handlers.push((Rc::from(name), handler.clone()));
            }
        }
        Rc::new(handlers)
    })
}

/// A component kind: a name plus its construction function.
///
/// Kind-specific state (a façade-owned mesh, trigger cells, text segments)
/// is captured by the closure.
#[derive(Clone)]
pub struct ComponentKind {
    pub name: &'static str,
    pub construct: Rc<dyn Fn(&ConstructArgs) -> Result<Internals>>,
}

impl ComponentKind {
    pub fn new(name: &'static str, construct: impl Fn(&ConstructArgs) -> Result<Internals> + 'static) -> Self {
        Self {
            name,
            construct: Rc::new(construct),
        }
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentKind").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{build_merged, record_cell, Conditionals, PropertyValue};
    use crate::reactive::signal;
    use crate::record;

    #[test]
    fn test_prop_value_sources() {
        let name = signal("a".to_string());
        let n = name.clone();
        let values: Vec<PropValue<String>> = vec![
            "static".into(),
            name.clone().into(),
            PropValue::getter(move || n.get().to_uppercase()),
        ];

        name.set("b".to_string());
        let read: Vec<String> = values.iter().map(PropValue::get).collect();
        assert_eq!(read, vec!["static", "b", "B"]);
    }

    #[test]
    fn test_event_handlers_collects_on_keys() {
        let click = EventHandler::new(|_| {});
        let over = EventHandler::new(|_| {});
        let props = record_cell(Some(record! {
            "onClick" => click.clone(),
            "onPointerOver" => PropertyValue::from(over.clone()),
            "online" => true,
            "onTap" => "not a handler",
        }));
        let merged = build_merged(Conditionals::new(), vec![props.read_only()]);
        let internal = EventHandler::new(|_| {});
        let handlers = event_handlers(&merged, vec![("pointerdown", internal.clone())]);

        let names: Vec<String> = handlers.peek().iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["pointerdown", "click", "pointerover"]);
        assert_eq!(handlers.peek()[1].1, click);
    }

    #[test]
    fn test_event_handlers_follow_conditionals() {
        let hovered = signal(false);
        let click = EventHandler::new(|_| {});
        let style = record_cell(Some(record! { "hover" => record! { "onClick" => click } }));
        let merged = build_merged(
            Conditionals::new().with("hover", hovered.read_only()),
            vec![style.read_only()],
        );
        let handlers = event_handlers(&merged, Vec::new());

        assert!(handlers.peek().is_empty());
        hovered.set(true);
        assert_eq!(handlers.peek().len(), 1);
    }
}
