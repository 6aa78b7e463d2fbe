//! Lifecycle Binder - One live generation per resolved ancestor context.
//!
//! The binder owns a single effect that depends on nothing but the
//! component's context cell. Each run is an explicit two-phase commit:
//!
//! 1. tear down the live generation, if any: stop providing context to
//!    children, release its subscriptions (handlers, initializers, attached
//!    nodes, generation resources), dispose its merged view
//! 2. if a context is resolved, build the next generation: construct,
//!    attach nodes, run initializers, bind handlers, provide child context
//!
//! ```text
//!            context resolved             context changed
//!   Unbound ─────────────────▶ Bound ───────────────────▶ Bound (N+1)
//!      ▲                         │
//!      └──── context lost ───────┘        destroy: any ──▶ Destroyed
//! ```
//!
//! Construction runs untracked, so what it reads never re-triggers the
//! binder. A failed build is rolled back before the error is reported; a
//! failed teardown is reported after the full teardown and the next build
//! still proceeds.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::engine::{add_child, detach, remove_child, NodeId, Subscriptions};
use crate::error::{Result, TeardownError, UikitError};
use crate::properties::MergedProperties;
use crate::reactive::{report_error, try_effect, untrack, Effect, Memo, ReadSignal, Signal};
use crate::state::context::Context;
use crate::state::events::bind_handlers;
use super::types::{ComponentKind, ConstructArgs, Internals, RecordInput};

// =============================================================================
// State
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinderState {
    /// No ancestor context, no generation.
    Unbound,
    /// One live generation.
    Bound,
    /// Terminal.
    Destroyed,
}

struct Generation {
    number: u64,
    merged: Memo<Rc<MergedProperties>>,
    subs: Subscriptions,
}

struct BinderCore {
    kind: ComponentKind,
    node: NodeId,
    style: RecordInput,
    properties: RecordInput,
    defaults: RecordInput,
    /// What this component provides to its children.
    provided: Signal<Option<Rc<Context>>>,
    state: RefCell<BinderState>,
    built: RefCell<u64>,
    live: RefCell<Option<Generation>>,
}

impl BinderCore {
    fn set_state(&self, state: BinderState) {
        let mut current = self.state.borrow_mut();
        if *current != BinderState::Destroyed {
            *current = state;
        }
    }

    fn teardown(&self) -> std::result::Result<(), TeardownError> {
        let Some(generation) = self.live.borrow_mut().take() else {
            return Ok(());
        };
        self.set_state(BinderState::Unbound);

        // Children must never resolve a context from a dead generation.
        self.provided.set(None);
        let result = generation.subs.release_all();
        generation.merged.dispose();

        match &result {
            Ok(()) => tracing::debug!(
                node = %self.node,
                kind = self.kind.name,
                generation = generation.number,
                "generation torn down"
            ),
            Err(error) => tracing::warn!(
                node = %self.node,
                kind = self.kind.name,
                generation = generation.number,
                failures = error.failures().len(),
                "generation torn down with failures"
            ),
        }
        result
    }

    fn build(&self, context: Rc<Context>) -> Result<()> {
        let args = ConstructArgs {
            context,
            style: self.style.clone(),
            properties: self.properties.clone(),
            defaults: self.defaults.clone(),
            node: self.node,
        };
        let Internals {
            merged_properties,
            initializers,
            handlers,
            nodes,
            resources,
            child_context,
        } = (self.kind.construct)(&args)?;

        // Resources go first so they are released last, after detaching.
        let mut subs = resources;
        let parent = self.node;
        let wired = (|| -> Result<()> {
            for node in nodes {
                add_child(parent, node)?;
                subs.register_fallible(move || remove_child(parent, node).map(|_| ()));
            }
            for init in initializers {
                init(&mut subs)?;
            }
            bind_handlers(handlers.read_only(), parent, &mut subs);
            subs.register(move || handlers.dispose());
            Ok(())
        })();

        if let Err(error) = wired {
            if let Err(teardown) = subs.release_all() {
                tracing::warn!(node = %self.node, %teardown, "rollback of a failed build was incomplete");
            }
            merged_properties.dispose();
            tracing::debug!(node = %self.node, kind = self.kind.name, %error, "generation build failed");
            return Err(error);
        }

        let number = {
            let mut built = self.built.borrow_mut();
            *built += 1;
            *built
        };
        *self.live.borrow_mut() = Some(Generation {
            number,
            merged: merged_properties,
            subs,
        });
        self.set_state(BinderState::Bound);
        tracing::debug!(node = %self.node, kind = self.kind.name, generation = number, "generation bound");

        if let Some(child_context) = child_context {
            self.provided.set(Some(child_context));
        }
        Ok(())
    }
}

// =============================================================================
// Binder
// =============================================================================

pub struct Binder {
    core: Rc<BinderCore>,
    effect: Effect,
}

impl Binder {
    /// Start binding `kind` on `node`.
    ///
    /// When `context` already holds a value the first generation is built
    /// before this returns; its errors reach the enclosing `try_batch`.
    pub fn new(
        kind: ComponentKind,
        node: NodeId,
        context: ReadSignal<Option<Rc<Context>>>,
        inputs: [RecordInput; 3],
        provided: Signal<Option<Rc<Context>>>,
    ) -> Self {
        let [defaults, properties, style] = inputs;
        let core = Rc::new(BinderCore {
            kind,
            node,
            style,
            properties,
            defaults,
            provided,
            state: RefCell::new(BinderState::Unbound),
            built: RefCell::new(0),
            live: RefCell::new(None),
        });

        let effect_core = core.clone();
        let effect = try_effect(move || {
            let resolved = context.get();
            untrack(|| {
                if let Err(teardown) = effect_core.teardown() {
                    report_error(UikitError::Teardown(teardown));
                }
                match resolved {
                    Some(context) => effect_core.build(context).map(|()| None),
                    None => Ok(None),
                }
            })
        });

        Self { core, effect }
    }

    pub fn state(&self) -> BinderState {
        *self.core.state.borrow()
    }

    /// Number of generations built so far.
    pub fn generation(&self) -> u64 {
        *self.core.built.borrow()
    }

    /// Merged view of the live generation.
    pub fn merged(&self) -> Option<Memo<Rc<MergedProperties>>> {
        self.core.live.borrow().as_ref().map(|generation| generation.merged.clone())
    }

    /// Detach from the parent, stop the effect and release the live
    /// generation. Calling it again does nothing.
    pub fn destroy(&self) -> Result<()> {
        if self.state() == BinderState::Destroyed {
            return Ok(());
        }
        *self.core.state.borrow_mut() = BinderState::Destroyed;

        let detached = detach(self.core.node);
        self.effect.dispose();
        let released = self.core.teardown();
        tracing::debug!(node = %self.core.node, kind = self.core.kind.name, "binder destroyed");

        match (detached, released) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(error), Ok(())) => Err(error),
            (Ok(()), Err(teardown)) => Err(teardown.into()),
            (Err(error), Err(teardown)) => {
                tracing::warn!(node = %self.core.node, %teardown, "teardown also failed after a failed detach");
                Err(error)
            }
        }
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("node", &self.core.node)
            .field("kind", &self.core.kind.name)
            .field("state", &self.state())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RootConfig;
    use crate::engine::{children_of, create_node, reset_registry, NodeKind};
    use crate::properties::{build_merged, record_cell, Conditionals};
    use crate::reactive::{identity_equals, signal_with_equals, try_batch};
    use crate::state::context::create_context_cell;
    use crate::state::events::reset_listeners;
    use super::super::types::event_handlers;
    use std::cell::Cell;
    use tracing_test::traced_test;

    struct Fixture {
        node: NodeId,
        context: Signal<Option<Rc<Context>>>,
        provided: Signal<Option<Rc<Context>>>,
        inputs: [RecordInput; 3],
    }

    fn fixture() -> Fixture {
        reset_registry();
        reset_listeners();
        Fixture {
            node: create_node(NodeKind::Component("test")),
            context: create_context_cell(),
            provided: signal_with_equals(None, identity_equals),
            inputs: [
                record_cell(None).read_only(),
                record_cell(None).read_only(),
                record_cell(None).read_only(),
            ],
        }
    }

    fn plain_kind(builds: Rc<Cell<u32>>, mesh: NodeId) -> ComponentKind {
        ComponentKind::new("plain", move |args| {
            builds.set(builds.get() + 1);
            let merged = build_merged(Conditionals::new(), args.inputs());
            let handlers = event_handlers(&merged, Vec::new());
            Ok(Internals::new(merged, handlers)
                .with_node(mesh)
                .with_child_context(args.context.child(args.node)))
        })
    }

    fn binder(fx: &Fixture, kind: ComponentKind) -> Binder {
        Binder::new(
            kind,
            fx.node,
            fx.context.read_only(),
            fx.inputs.clone(),
            fx.provided.clone(),
        )
    }

    #[test]
    fn test_binds_when_context_resolves() {
        let fx = fixture();
        let mesh = create_node(NodeKind::Group);
        let builds = Rc::new(Cell::new(0));
        let binder = binder(&fx, plain_kind(builds.clone(), mesh));

        assert_eq!(binder.state(), BinderState::Unbound);
        assert!(binder.merged().is_none());

        fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));
        assert_eq!(binder.state(), BinderState::Bound);
        assert_eq!(binder.generation(), 1);
        assert_eq!(children_of(fx.node), vec![mesh]);
        assert_eq!(fx.provided.peek().map(|c| c.depth), Some(1));

        fx.context.set(None);
        assert_eq!(binder.state(), BinderState::Unbound);
        assert!(children_of(fx.node).is_empty());
        assert!(fx.provided.peek().is_none());
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn test_context_change_rebuilds_once() {
        let fx = fixture();
        let mesh = create_node(NodeKind::Group);
        let builds = Rc::new(Cell::new(0));
        let binder = binder(&fx, plain_kind(builds.clone(), mesh));

        fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));
        fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));
        assert_eq!(builds.get(), 2);
        assert_eq!(binder.generation(), 2);
        assert_eq!(children_of(fx.node), vec![mesh]);
    }

    #[test]
    fn test_failed_build_rolls_back() {
        let fx = fixture();
        let mesh = create_node(NodeKind::Group);
        let kind = ComponentKind::new("broken", move |args| {
            let merged = build_merged(Conditionals::new(), args.inputs());
            let handlers = event_handlers(&merged, Vec::new());
            Ok(Internals::new(merged, handlers)
                .with_node(mesh)
                .with_initializer(|_| Err(UikitError::construction("broken", "no geometry"))))
        });
        let binder = binder(&fx, kind);

        let result = try_batch(|| {
            fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));
        });
        assert!(matches!(result, Err(UikitError::Construction { kind: "broken", .. })));
        assert_eq!(binder.state(), BinderState::Unbound);
        assert_eq!(binder.generation(), 0);
        assert!(children_of(fx.node).is_empty());
        assert!(fx.provided.peek().is_none());
    }

    #[test]
    fn test_teardown_failure_still_rebuilds() {
        let fx = fixture();
        let attempts = Rc::new(Cell::new(0));
        let a = attempts.clone();
        let kind = ComponentKind::new("flaky", move |args| {
            let merged = build_merged(Conditionals::new(), args.inputs());
            let handlers = event_handlers(&merged, Vec::new());
            let a = a.clone();
            Ok(Internals::new(merged, handlers).with_initializer(move |subs| {
                subs.register_fallible(move || {
                    a.set(a.get() + 1);
                    Err(UikitError::cleanup("listener already gone"))
                });
                Ok(())
            }))
        });
        let binder = binder(&fx, kind);

        fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));
        let result = try_batch(|| {
            fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));
        });

        assert!(matches!(result, Err(UikitError::Teardown(_))));
        assert_eq!(attempts.get(), 1);
        assert_eq!(binder.state(), BinderState::Bound);
        assert_eq!(binder.generation(), 2);
    }

    #[traced_test]
    #[test]
    fn test_transitions_are_logged() {
        let fx = fixture();
        let mesh = create_node(NodeKind::Group);
        let _binder = binder(&fx, plain_kind(Rc::new(Cell::new(0)), mesh));

        fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));
        fx.context.set(None);

        assert!(logs_contain("generation bound"));
        assert!(logs_contain("generation torn down"));
        assert!(logs_contain("plain"));
    }

    #[traced_test]
    #[test]
    fn test_failure_outside_try_batch_is_logged() {
        let fx = fixture();
        let kind = ComponentKind::new("broken", |_| Err(UikitError::construction("broken", "no font")));
        let binder = binder(&fx, kind);

        fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));
        assert_eq!(binder.state(), BinderState::Unbound);
        assert!(logs_contain("effect failed outside of an error scope"));
        assert!(logs_contain("no font"));
    }

    #[test]
    fn test_destroy_is_terminal_and_idempotent() {
        let fx = fixture();
        let mesh = create_node(NodeKind::Group);
        let builds = Rc::new(Cell::new(0));
        let binder = binder(&fx, plain_kind(builds.clone(), mesh));
        fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));

        binder.destroy().unwrap();
        binder.destroy().unwrap();
        assert_eq!(binder.state(), BinderState::Destroyed);
        assert!(children_of(fx.node).is_empty());

        fx.context.set(Some(Context::for_root(fx.node, RootConfig::default())));
        assert_eq!(builds.get(), 1);
        assert_eq!(binder.state(), BinderState::Destroyed);
    }
}
