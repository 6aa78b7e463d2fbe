//! Events Module - Listener registry and dispatch.
//!
//! Host input wiring (ray casting, pointer capture) lives outside this
//! crate. The host resolves a target node and calls [`dispatch`]; this
//! module only keeps track of who listens where.
//!
//! # API
//!
//! - `add_listener(node, name, handler)` - listen on one node
//! - `remove_listener(node, id)` - stop listening
//! - `dispatch(event)` - call every listener for `event.name` on `event.target`
//! - `bind_handlers(handlers, node, subs)` - keep a reactive handler set
//!   installed for the lifetime of a subscription list

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::engine::{NodeId, Subscriptions};
use crate::reactive::{effect_with_cleanup, CleanupFn, ReadSignal};

// =============================================================================
// TYPES
// =============================================================================

/// An input event addressed to one node.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Lower-case event name, e.g. "click", "pointerover".
    pub name: Rc<str>,
    pub target: NodeId,
}

impl Event {
    pub fn new(name: &str, target: NodeId) -> Self {
        Self {
            name: Rc::from(name),
            target,
        }
    }
}

/// Shared event callback. Compared by identity.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Event name → handler pairs, in binding order. A name may repeat.
pub type EventHandlers = Vec<(Rc<str>, EventHandler)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Map a property key such as `onPointerOver` to its event name
/// (`pointerover`). Keys without the `on` prefix, or with a lower-case
/// letter right after it, are not handler keys.
pub fn event_name_for_key(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    if !rest.chars().next()?.is_ascii_uppercase() {
        return None;
    }
    Some(rest.to_ascii_lowercase())
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    listeners: HashMap<NodeId, Vec<(ListenerId, Rc<str>, EventHandler)>>,
}

thread_local! {
    static REGISTRY: RefCell<ListenerRegistry> = RefCell::new(ListenerRegistry::default());
}

// =============================================================================
// LISTENERS
// =============================================================================

pub fn add_listener(target: NodeId, name: &str, handler: EventHandler) -> ListenerId {
    REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        reg.next_id += 1;
        let id = ListenerId(reg.next_id);
        reg.listeners
            .entry(target)
            .or_default()
            .push((id, Rc::from(name), handler));
        id
    })
}

pub fn remove_listener(target: NodeId, id: ListenerId) -> bool {
    REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let Some(list) = reg.listeners.get_mut(&target) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener, _, _)| *listener != id);
        let removed = list.len() != before;
        if list.is_empty() {
            reg.listeners.remove(&target);
        }
        removed
    })
}

/// Drop every listener on `target`.
pub fn cleanup_node(target: NodeId) {
    REGISTRY.with(|reg| {
        reg.borrow_mut().listeners.remove(&target);
    });
}

pub fn listener_count(target: NodeId) -> usize {
    REGISTRY.with(|reg| reg.borrow().listeners.get(&target).map_or(0, Vec::len))
}

/// Call the listeners for `event` on its target, in registration order.
///
/// Returns how many were called. Handlers may add or remove listeners; the
/// set called is the one registered when dispatch started.
pub fn dispatch(event: &Event) -> usize {
    let handlers: Vec<EventHandler> = REGISTRY.with(|reg| {
        reg.borrow()
            .listeners
            .get(&event.target)
            .map(|list| {
                list.iter()
                    .filter(|(_, name, _)| **name == *event.name)
                    .map(|(_, _, handler)| handler.clone())
                    .collect()
            })
            .unwrap_or_default()
    });
    for handler in &handlers {
        handler.call(event);
    }
    handlers.len()
}

/// Reset all listener state (for testing).
pub fn reset_listeners() {
    REGISTRY.with(|reg| *reg.borrow_mut() = ListenerRegistry::default());
}

// =============================================================================
// BINDING
// =============================================================================

/// Install `handlers` on `target` and keep them in sync.
///
/// When the handler set changes, the previous listeners are removed before
/// the new ones are added. Releasing `subs` removes the last set.
pub fn bind_handlers(handlers: ReadSignal<Rc<EventHandlers>>, target: NodeId, subs: &mut Subscriptions) {
    let binding = effect_with_cleanup(move || {
        let current = handlers.get();
        let ids: Vec<ListenerId> = current
            .iter()
            .map(|(name, handler)| add_listener(target, name, handler.clone()))
            .collect();
        Some(Box::new(move || {
            for id in ids {
                remove_listener(target, id);
            }
        }) as CleanupFn)
    });
    subs.register_effect(binding);
}
