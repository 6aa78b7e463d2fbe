//! Context Propagation - Nearest-ancestor context, kept reactive.
//!
//! Every component owns a [`ContextCell`] holding the context of its nearest
//! parent, or nothing when it is unparented or the parent provides none.
//! [`bind_context_cell`] keeps the cell in sync with two things:
//! - the node's parent link (attach, detach, re-parent)
//! - the value the parent currently provides
//!
//! Because providers clear what they provide before tearing a generation
//! down, a cell never holds a context from a dead generation. Changes flow
//! down one level per hop, so a root change reaches every leaf without any
//! leaf being re-attached.

use std::rc::Rc;

use crate::config::RootConfig;
use crate::engine::{parent_of, provided_context, NodeId};
use crate::reactive::{effect, identity_equals, signal_with_equals, Effect, Signal};

// =============================================================================
// Types
// =============================================================================

/// State shared by every component under one root.
#[derive(Debug)]
pub struct RootContext {
    pub node: NodeId,
    pub config: RootConfig,
}

/// What a component resolves from its ancestor chain.
///
/// Holds the root state and the id of the providing node, never the
/// providing component itself.
#[derive(Debug)]
pub struct Context {
    pub root: Rc<RootContext>,
    pub provider: NodeId,
    pub depth: usize,
}

impl Context {
    /// Context of a root component, provided by itself.
    pub fn for_root(node: NodeId, config: RootConfig) -> Rc<Self> {
        Rc::new(Self {
            root: Rc::new(RootContext { node, config }),
            provider: node,
            depth: 0,
        })
    }

    /// Context a component provides to its own children.
    pub fn child(&self, provider: NodeId) -> Rc<Self> {
        Rc::new(Self {
            root: self.root.clone(),
            provider,
            depth: self.depth + 1,
        })
    }

    pub fn config(&self) -> &RootConfig {
        &self.root.config
    }
}

/// A component's view of its nearest ancestor's context.
pub type ContextCell = Signal<Option<Rc<Context>>>;

// =============================================================================
// Cells
// =============================================================================

/// A fresh, empty cell. Writes compare by identity.
pub fn create_context_cell() -> ContextCell {
    signal_with_equals(None, identity_equals)
}

/// Keep `cell` equal to what the parent of `node` provides.
///
/// The returned effect must live as long as the component; disposing it
/// freezes the cell at its last value.
pub fn bind_context_cell(cell: &ContextCell, node: NodeId) -> Effect {
    let cell = cell.clone();
    effect(move || {
        let resolved = parent_of(node)
            .and_then(provided_context)
            .and_then(|provided| provided.get());
        cell.set(resolved);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{add_child, create_node, provide_context, remove_child, reset_registry, NodeKind};

    #[test]
    fn test_unparented_cell_is_empty() {
        reset_registry();

        let node = create_node(NodeKind::Group);
        let cell = create_context_cell();
        let _binding = bind_context_cell(&cell, node);
        assert!(cell.peek().is_none());
    }

    #[test]
    fn test_cell_follows_parent_and_provider() {
        reset_registry();

        let parent = create_node(NodeKind::Group);
        let child = create_node(NodeKind::Group);
        let provided = create_context_cell();
        provide_context(parent, provided.read_only()).unwrap();

        let cell = create_context_cell();
        let _binding = bind_context_cell(&cell, child);

        add_child(parent, child).unwrap();
        assert!(cell.peek().is_none());

        let ctx = Context::for_root(parent, RootConfig::default());
        provided.set(Some(ctx.clone()));
        assert!(cell.peek().is_some_and(|c| Rc::ptr_eq(&c, &ctx)));

        remove_child(parent, child).unwrap();
        assert!(cell.peek().is_none());
    }

    #[test]
    fn test_parent_without_provider_yields_empty() {
        reset_registry();

        let group = create_node(NodeKind::Group);
        let child = create_node(NodeKind::Group);
        let cell = create_context_cell();
        let _binding = bind_context_cell(&cell, child);
        add_child(group, child).unwrap();
        assert!(cell.peek().is_none());
    }

    #[test]
    fn test_child_context_increments_depth() {
        let root = Context::for_root(create_node(NodeKind::Group), RootConfig::default());
        let nested = root.child(root.provider).child(root.provider);
        assert_eq!(nested.depth, 2);
        assert!(Rc::ptr_eq(&nested.root, &root.root));
    }
}
