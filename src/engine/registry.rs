//! Scene Registry - Node allocation and parent/child links.
//!
//! Manages the scene graph the components live in:
//! - Monotonic index allocation (a released id is never handed out again)
//! - Ordered children per node
//! - A reactive parent link per node (the structural-change notification)
//! - The context each node provides to its children, if any
//!
//! Nodes refer to each other by [`NodeId`] only. Nothing in the registry
//! holds a component alive.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, UikitError};
use crate::reactive::{signal, try_batch, untrack, ReadSignal, Signal};
use crate::renderer::Mesh;
use crate::state::context::Context;

// =============================================================================
// Types
// =============================================================================

/// Index of a node in the scene registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a scene node is.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Plain grouping node. Provides no context.
    Group,
    /// A component's own node; the string is the kind name.
    Component(&'static str),
    /// A renderable mesh attached by a component generation.
    Mesh(Mesh),
}

/// Reactive context a node exposes to its children.
pub type ProvidedContext = ReadSignal<Option<Rc<Context>>>;

struct NodeEntry {
    kind: NodeKind,
    parent: Signal<Option<NodeId>>,
    children: Vec<NodeId>,
    provided: Option<ProvidedContext>,
}

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    static NODES: RefCell<HashMap<usize, NodeEntry>> = RefCell::new(HashMap::new());

    /// Next index to allocate.
    static NEXT_INDEX: RefCell<usize> = const { RefCell::new(0) };
}

fn with_entry<R>(node: NodeId, f: impl FnOnce(&NodeEntry) -> R) -> Result<R> {
    NODES.with(|nodes| {
        nodes
            .borrow()
            .get(&node.0)
            .map(f)
            .ok_or(UikitError::UnknownNode(node))
    })
}

fn with_entry_mut<R>(node: NodeId, f: impl FnOnce(&mut NodeEntry) -> R) -> Result<R> {
    NODES.with(|nodes| {
        nodes
            .borrow_mut()
            .get_mut(&node.0)
            .map(f)
            .ok_or(UikitError::UnknownNode(node))
    })
}

// =============================================================================
// Allocation
// =============================================================================

/// Allocate a node.
///
/// Indices are not recycled, so a [`NodeId`] kept after its node was
/// released never refers to a different node.
pub fn create_node(kind: NodeKind) -> NodeId {
    let index = NEXT_INDEX.with(|next| {
        let mut next = next.borrow_mut();
        let index = *next;
        *next += 1;
        index
    });

    NODES.with(|nodes| {
        nodes.borrow_mut().insert(
            index,
            NodeEntry {
                kind,
                parent: signal(None),
                children: Vec::new(),
                provided: None,
            },
        );
    });

    NodeId(index)
}

/// Release a node.
///
/// Detaches it from its parent, orphans its children (they stay allocated,
/// their parent link becomes `None`). Releasing an unknown node is a no-op.
pub fn release_node(node: NodeId) -> Result<()> {
    if !is_alive(node) {
        return Ok(());
    }
    try_batch(|| -> Result<()> {
        detach(node)?;
        for child in children_of(node) {
            remove_child(node, child)?;
        }
        Ok(())
    })??;

    NODES.with(|nodes| nodes.borrow_mut().remove(&node.0));
    tracing::trace!(%node, "scene node released");
    Ok(())
}

// =============================================================================
// Structure
// =============================================================================

/// Attach `child` as the last child of `parent`.
///
/// A child that already has another parent is removed from it first. The
/// parent link changes once, so observers see a single transition. Errors
/// raised by effects reacting to the attach are returned here.
pub fn add_child(parent: NodeId, child: NodeId) -> Result<()> {
    with_entry(parent, |_| ())?;
    let (link, previous) = with_entry(child, |entry| (entry.parent.clone(), entry.parent.peek()))?;

    if previous == Some(parent) {
        return Ok(());
    }
    if parent == child || is_ancestor(child, parent) {
        return Err(UikitError::Cycle { parent, child });
    }

    if let Some(previous) = previous {
        with_entry_mut(previous, |entry| entry.children.retain(|c| *c != child))?;
    }
    with_entry_mut(parent, |entry| entry.children.push(child))?;

    tracing::trace!(%parent, %child, "scene node attached");
    try_batch(|| {
        link.set(Some(parent));
    })
}

/// Detach `child` from `parent`. Returns false when it was not a child.
pub fn remove_child(parent: NodeId, child: NodeId) -> Result<bool> {
    let removed = with_entry_mut(parent, |entry| {
        let before = entry.children.len();
        entry.children.retain(|c| *c != child);
        entry.children.len() != before
    })?;
    if !removed {
        return Ok(false);
    }
    let link = with_entry(child, |entry| entry.parent.clone())?;

    tracing::trace!(%parent, %child, "scene node detached");
    try_batch(|| {
        link.set(None);
    })?;
    Ok(true)
}

/// Detach `node` from whatever parent it has.
pub fn detach(node: NodeId) -> Result<()> {
    match peek_parent(node) {
        Some(parent) => remove_child(parent, node).map(|_| ()),
        None => Ok(()),
    }
}

/// True if `ancestor` is `node` or one of its ancestors.
fn is_ancestor(ancestor: NodeId, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = peek_parent(id);
    }
    false
}

// =============================================================================
// Lookups
// =============================================================================

/// Parent of `node`. Tracked: an effect calling this re-runs when the node is
/// attached, detached or re-parented.
pub fn parent_of(node: NodeId) -> Option<NodeId> {
    let link = with_entry(node, |entry| entry.parent.clone()).ok()?;
    link.get()
}

/// Parent of `node`, without tracking.
pub fn peek_parent(node: NodeId) -> Option<NodeId> {
    untrack(|| {
        with_entry(node, |entry| entry.parent.peek())
            .ok()
            .flatten()
    })
}

pub fn children_of(node: NodeId) -> Vec<NodeId> {
    with_entry(node, |entry| entry.children.clone()).unwrap_or_default()
}

pub fn node_kind(node: NodeId) -> Option<NodeKind> {
    with_entry(node, |entry| entry.kind.clone()).ok()
}

pub fn is_alive(node: NodeId) -> bool {
    NODES.with(|nodes| nodes.borrow().contains_key(&node.0))
}

// =============================================================================
// Provided Context
// =============================================================================

/// Expose `context` to the children of `node`.
pub fn provide_context(node: NodeId, context: ProvidedContext) -> Result<()> {
    with_entry_mut(node, |entry| entry.provided = Some(context))
}

/// The context `node` exposes to its children, if it exposes one.
pub fn provided_context(node: NodeId) -> Option<ProvidedContext> {
    with_entry(node, |entry| entry.provided.clone()).ok().flatten()
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
pub fn reset_registry() {
    NODES.with(|nodes| nodes.borrow_mut().clear());
    NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::effect;
    use std::cell::RefCell;

    #[test]
    fn test_released_ids_are_not_reused() {
        reset_registry();

        let a = create_node(NodeKind::Group);
        let b = create_node(NodeKind::Group);
        assert_eq!((a.index(), b.index()), (0, 1));

        release_node(a).unwrap();
        assert!(!is_alive(a));
        let c = create_node(NodeKind::Group);
        assert_ne!(c, a);
        assert!(!is_alive(a));
        assert_eq!(c.index(), 2);
    }

    #[test]
    fn test_reparent_moves_child() {
        reset_registry();

        let a = create_node(NodeKind::Group);
        let b = create_node(NodeKind::Group);
        let child = create_node(NodeKind::Group);

        add_child(a, child).unwrap();
        add_child(b, child).unwrap();

        assert!(children_of(a).is_empty());
        assert_eq!(children_of(b), vec![child]);
        assert_eq!(peek_parent(child), Some(b));
    }

    #[test]
    fn test_children_keep_insertion_order() {
        reset_registry();

        let parent = create_node(NodeKind::Group);
        let kids: Vec<_> = (0..3).map(|_| create_node(NodeKind::Group)).collect();
        for kid in &kids {
            add_child(parent, *kid).unwrap();
        }
        assert_eq!(children_of(parent), kids);
    }

    #[test]
    fn test_cycle_rejected() {
        reset_registry();

        let root = create_node(NodeKind::Group);
        let leaf = create_node(NodeKind::Group);
        add_child(root, leaf).unwrap();

        assert!(matches!(add_child(leaf, root), Err(UikitError::Cycle { .. })));
        assert!(matches!(add_child(root, root), Err(UikitError::Cycle { .. })));
    }

    #[test]
    fn test_unknown_node() {
        reset_registry();

        let real = create_node(NodeKind::Group);
        let ghost = create_node(NodeKind::Group);
        release_node(ghost).unwrap();
        assert!(matches!(add_child(real, ghost), Err(UikitError::UnknownNode(_))));
        assert!(!remove_child(real, ghost).unwrap());
    }

    #[test]
    fn test_parent_link_is_reactive() {
        reset_registry();

        let parent = create_node(NodeKind::Group);
        let child = create_node(NodeKind::Group);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _watch = effect(move || s.borrow_mut().push(parent_of(child)));

        add_child(parent, child).unwrap();
        remove_child(parent, child).unwrap();
        assert_eq!(*seen.borrow(), vec![None, Some(parent), None]);
    }

    #[test]
    fn test_release_orphans_children() {
        reset_registry();

        let grandparent = create_node(NodeKind::Group);
        let parent = create_node(NodeKind::Group);
        let child = create_node(NodeKind::Group);
        add_child(grandparent, parent).unwrap();
        add_child(parent, child).unwrap();

        release_node(parent).unwrap();
        release_node(parent).unwrap();
        assert!(children_of(grandparent).is_empty());
        assert!(is_alive(child));
        assert_eq!(peek_parent(child), None);
    }
}
