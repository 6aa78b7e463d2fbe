//! Component - The façade every kind shares.
//!
//! A component is a scene node plus three input cells (style, properties,
//! defaults), a context cell and a [`Binder`]. Kinds differ only in the
//! [`ComponentKind`] they hand in.
//!
//! Every operation that writes a cell is a flush entry point: effects that
//! react to the write run before it returns, and the first error any of
//! them raised is returned.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::engine::{create_node, provide_context, release_node, NodeId, NodeKind, Subscriptions};
use crate::error::{Result, UikitError};
use crate::properties::{record_cell, PropertyRecord, PropertyValue, RecordCell};
use crate::reactive::{identity_equals, signal_with_equals, try_batch, untrack, Effect};
use crate::state::context::{bind_context_cell, create_context_cell, ContextCell};
use crate::state::events::cleanup_node;
use super::binder::{Binder, BinderState};
use super::types::{ComponentInputs, ComponentKind};

pub struct Component {
    kind: &'static str,
    node: NodeId,
    style: RecordCell,
    properties: RecordCell,
    defaults: RecordCell,
    context: ContextCell,
    context_binding: Option<Effect>,
    binder: Binder,
    /// Resources the façade owns across generations.
    owned: RefCell<Option<Subscriptions>>,
    destroyed: Cell<bool>,
}

impl Component {
    /// Create a component that resolves its context from its parent.
    ///
    /// It stays unbound until attached under a node that provides one.
    pub fn new(kind: ComponentKind) -> Result<Self> {
        Self::create(kind, None, ComponentInputs::default())
    }

    /// Like [`new`](Self::new), with the input cells seeded from `inputs`.
    /// The first generation sees them without any setter call.
    pub fn with_inputs(kind: ComponentKind, inputs: ComponentInputs) -> Result<Self> {
        Self::create(kind, None, inputs)
    }

    /// Create a component whose context cell is driven by the caller rather
    /// than by a parent. Used for roots.
    pub fn with_context(kind: ComponentKind, context: ContextCell) -> Result<Self> {
        Self::create(kind, Some(context), ComponentInputs::default())
    }

    fn create(kind: ComponentKind, preset: Option<ContextCell>, inputs: ComponentInputs) -> Result<Self> {
        let name = kind.name;
        let node = create_node(NodeKind::Component(name));
        let style = record_cell(inputs.style);
        let properties = record_cell(inputs.properties);
        let defaults = record_cell(inputs.defaults);
        let provided = signal_with_equals(None, identity_equals);
        provide_context(node, provided.read_only())?;

        let bound_to_parent = preset.is_none();
        let context = preset.unwrap_or_else(create_context_cell);

        let (context_binding, binder) = try_batch(|| {
            let context_binding = bound_to_parent.then(|| bind_context_cell(&context, node));
            let binder = Binder::new(
                kind,
                node,
                context.read_only(),
                [defaults.read_only(), properties.read_only(), style.read_only()],
                provided,
            );
            (context_binding, binder)
        })?;
        tracing::trace!(%node, kind = name, "component created");

        Ok(Self {
            kind: name,
            node,
            style,
            properties,
            defaults,
            context,
            context_binding,
            binder,
            owned: RefCell::new(Some(Subscriptions::new())),
            destroyed: Cell::new(false),
        })
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Replace the local style, or shallow-merge `style` into it.
    ///
    /// Merging combines the current value with `style` once, at call time.
    /// Merging `None` leaves the style as it is; replacing with `None`
    /// clears it.
    pub fn set_style(&self, style: Option<PropertyRecord>, replace: bool) -> Result<()> {
        let next = if replace {
            style.map(Rc::new)
        } else {
            match (self.style.peek(), style) {
                (current, None) => current,
                (None, Some(patch)) => Some(Rc::new(patch)),
                (Some(current), Some(patch)) => Some(Rc::new(current.merged_with(&patch))),
            }
        };
        try_batch(|| {
            self.style.set(next);
        })
    }

    /// Replace the externally assigned properties.
    pub fn set_properties(&self, properties: Option<PropertyRecord>) -> Result<()> {
        try_batch(|| {
            self.properties.set(properties.map(Rc::new));
        })
    }

    /// Replace the inherited defaults.
    pub fn set_default_properties(&self, defaults: Option<PropertyRecord>) -> Result<()> {
        try_batch(|| {
            self.defaults.set(defaults.map(Rc::new));
        })
    }

    /// The last style written, untracked.
    pub fn get_style(&self) -> Option<Rc<PropertyRecord>> {
        self.style.peek()
    }

    /// Resolve `key` through the live generation's merged view, untracked.
    ///
    /// `None` while unbound or when no input defines the key.
    pub fn get_computed_property(&self, key: &str) -> Option<PropertyValue> {
        untrack(|| {
            let merged = self.binder.merged()?;
            merged.peek().read(key, None)
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Register a cleanup for a resource this façade owns. Runs on
    /// [`destroy`](Self::destroy), after the final generation is released.
    pub fn own(&self, release: impl FnOnce() + 'static) {
        match self.owned.borrow_mut().as_mut() {
            Some(owned) => owned.register(release),
            // Already destroyed: nothing will release it later.
            None => release(),
        }
    }

    /// Detach, stop binding, release the final generation and everything
    /// the façade owns. A second call is a no-op.
    pub fn destroy(&self) -> Result<()> {
        if self.destroyed.replace(true) {
            return Ok(());
        }
        let node = self.node;
        let owned = self.owned.borrow_mut().take();

        let mut errors = Vec::new();
        let flushed = try_batch(|| {
            if let Some(binding) = &self.context_binding {
                binding.dispose();
            }
            let unbound = self.binder.destroy();
            let released = match owned {
                Some(owned) => owned.release_all().map_err(UikitError::from),
                None => Ok(()),
            };
            let removed = release_node(node);
            cleanup_node(node);
            errors.extend([unbound, released, removed].into_iter().filter_map(Result::err));
        });
        if let Err(error) = flushed {
            errors.push(error);
        }
        tracing::debug!(%node, kind = self.kind, "component destroyed");

        let mut errors = errors.into_iter();
        let first = errors.next();
        for extra in errors {
            tracing::warn!(%node, error = %extra, "additional error while destroying component");
        }
        first.map_or(Ok(()), Err)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind
    }

    pub fn state(&self) -> BinderState {
        self.binder.state()
    }

    pub fn is_bound(&self) -> bool {
        self.binder.state() == BinderState::Bound
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Number of generations built so far.
    pub fn generation(&self) -> u64 {
        self.binder.generation()
    }

    /// The context cell this component resolves.
    pub fn context(&self) -> ContextCell {
        self.context.clone()
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        if let Err(error) = self.destroy() {
            tracing::warn!(node = %self.node, kind = self.kind, %error, "destroy on drop failed");
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind)
            .field("node", &self.node)
            .field("state", &self.state())
            .field("generation", &self.generation())
            .finish()
    }
}
