//! # spark-uikit
//!
//! Reactive, style-driven UI components for 3D scene graphs.
//!
//! ## Architecture
//!
//! Components are defined with CSS-like property records. Three inputs per
//! component (defaults, properties, style) merge into one precedence view,
//! and everything derived from it stays in sync through fine-grained
//! reactivity. Nothing is re-rendered by hand:
//! ```text
//! attach → context cell resolves → binder builds a generation
//!        → merged view → initializers, handlers, child context
//! ```
//!
//! Scene nodes live in a thread-local registry and are addressed by
//! [`NodeId`]; components never hold their ancestors.
//!
//! ## Modules
//!
//! - [`reactive`] - Signals, effects, memos, batching
//! - [`engine`] - Scene registry and subscription lists
//! - [`properties`] - Property records and the merge engine
//! - [`state`] - Context propagation and event listeners
//! - [`renderer`] - Mesh, geometry and material stand-ins
//! - [`primitives`] - Binder, component façade, Root/Container/Text/Image
//! - [`config`] - Root configuration
//! - [`error`] - Error types

pub mod config;
pub mod engine;
pub mod error;
pub mod primitives;
pub mod properties;
pub mod reactive;
pub mod renderer;
pub mod state;

// Re-export commonly used items
pub use config::RootConfig;
pub use error::{Result, TeardownError, UikitError};

pub use engine::{
    add_child, children_of, create_node, detach, node_kind, parent_of, peek_parent,
    release_node, remove_child, reset_registry, NodeId, NodeKind, Subscriptions,
};

pub use primitives::{
    Binder, BinderState, Component, ComponentInputs, ComponentKind, ConstructArgs, Container, Image,
    Internals, PropValue, Root, Text,
};

pub use properties::{build_merged, Conditionals, MergedProperties, PropertyRecord, PropertyValue};

pub use reactive::{batch, effect, memo, signal, try_batch, untrack, Effect, Memo, ReadSignal, Signal};

pub use state::{
    dispatch, reset_listeners, Context, ContextCell, Event, EventHandler,
};
