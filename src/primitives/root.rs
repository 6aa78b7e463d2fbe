//! Root Primitive - Top of a component tree.
//!
//! The root's context cell is not bound to a parent: it is preset from the
//! root's [`RootConfig`]. Everything attached below it, directly or through
//! containers, resolves its context from here.
//!
//! # Example
//!
//! ```ignore
//! use spark_uikit::config::RootConfig;
//! use spark_uikit::engine::add_child;
//! use spark_uikit::primitives::{Container, Root};
//!
//! let root = Root::new(RootConfig::default())?;
//! let panel = Container::new()?;
//! add_child(root.node(), panel.node())?; // panel binds
//!
//! // Every descendant rebuilds with the new font table.
//! root.set_config(RootConfig::default().with_font_family("mono", "fonts/mono.json"))?;
//! ```

use std::ops::Deref;

use crate::config::RootConfig;
use crate::error::Result;
use crate::properties::{build_merged, Conditionals};
use crate::reactive::try_batch;
use crate::state::context::{create_context_cell, Context, ContextCell};
use super::component::Component;
use super::types::{event_handlers, ComponentKind, Internals};

fn root_kind() -> ComponentKind {
    ComponentKind::new("root", |args| {
        let merged = build_merged(Conditionals::new(), args.inputs());
        let handlers = event_handlers(&merged, Vec::new());
        Ok(Internals::new(merged, handlers).with_child_context(args.context.child(args.node)))
    })
}

#[derive(Debug)]
pub struct Root {
    component: Component,
    context: ContextCell,
}

impl Root {
    /// Create a root. It is bound as soon as this returns.
    pub fn new(config: RootConfig) -> Result<Self> {
        let context = create_context_cell();
        let component = Component::with_context(root_kind(), context.clone())?;
        let root = Self { component, context };
        root.set_config(config)?;
        Ok(root)
    }

    /// Replace the configuration. The root and every descendant rebuild.
    pub fn set_config(&self, config: RootConfig) -> Result<()> {
        let node = self.component.node();
        try_batch(|| {
            self.context.set(Some(Context::for_root(node, config)));
        })
    }

    pub fn config(&self) -> Option<RootConfig> {
        self.context.peek().map(|context| context.config().clone())
    }
}

impl Deref for Root {
    type Target = Component;

    fn deref(&self) -> &Component {
        &self.component
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{provided_context, reset_registry};
    use crate::state::events::reset_listeners;

    fn setup() {
        reset_registry();
        reset_listeners();
    }

    #[test]
    fn test_root_binds_immediately() {
        setup();
        let root = Root::new(RootConfig::default()).unwrap();
        assert!(root.is_bound());
        assert_eq!(root.kind_name(), "root");
        assert_eq!(root.generation(), 1);

        let provided = provided_context(root.node()).and_then(|p| p.peek());
        assert_eq!(provided.map(|c| c.depth), Some(1));
    }

    #[test]
    fn test_set_config_rebuilds() {
        setup();
        let root = Root::new(RootConfig::default()).unwrap();
        root.set_config(RootConfig::default().with_pixel_size(0.5)).unwrap();

        assert_eq!(root.generation(), 2);
        assert_eq!(root.config().map(|c| c.pixel_size), Some(0.5));
    }

    #[test]
    fn test_destroyed_root_ignores_config() {
        setup();
        let root = Root::new(RootConfig::default()).unwrap();
        root.destroy().unwrap();
        root.set_config(RootConfig::default()).unwrap();
        assert!(!root.is_bound());
        assert_eq!(root.generation(), 1);
    }
}
