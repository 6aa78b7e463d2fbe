//! UI Primitives - Component building blocks.
//!
//! This module provides the component kinds:
//! - [`Root`] - top of a tree, owns the [`RootConfig`](crate::config::RootConfig)
//! - [`Container`] - panel with `hover`/`active` states, provides context
//! - [`Text`] - text content laid out with the root's font table
//! - [`Image`] - textured plane
//!
//! # Architecture
//!
//! Every kind is a thin façade over [`Component`], which owns the input
//! cells and a [`Binder`]. A kind is data, a [`ComponentKind`] holding its
//! construction function:
//!
//! 1. The component node is attached under a context provider
//! 2. Its context cell resolves, and the binder builds a generation
//! 3. The construction function returns [`Internals`] (merged view,
//!    initializers, handlers, nodes, child context)
//! 4. The binder attaches, initializes, binds and provides
//! 5. Any context change tears that generation down before the next build
//!
//! # Reactivity
//!
//! Inputs stay connected: setters write cells, and the live generation's
//! merged view and initializers follow. Only a context change rebuilds a
//! generation.
//!
//! ```ignore
//! // Re-runs the material initializer, not the construction function.
//! container.set_style(Some(record! { "opacity" => 0.5 }), false)?;
//! ```

mod appearance;
mod binder;
mod component;
mod container;
mod image;
mod root;
mod text;
mod types;

pub use appearance::{is_visible, material_initializer};
pub use binder::{Binder, BinderState};
pub use component::Component;
pub use container::Container;
pub use image::Image;
pub use root::Root;
pub use text::Text;
pub use types::*;
