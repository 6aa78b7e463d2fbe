//! Text Primitive - Text content laid out for the glyph pipeline.
//!
//! A leaf component: it provides no context to children. Each generation
//! creates its own interaction panel (a mesh plus material) and releases
//! both on teardown.
//!
//! # Reactivity
//!
//! Content is a list of segments, each a static string, a signal, or a
//! getter. Segments are concatenated; when any source changes, the label
//! updates without rebuilding the generation.
//!
//! # Example
//!
//! ```ignore
//! use spark_uikit::primitives::{PropValue, Text};
//! use spark_uikit::reactive::signal;
//!
//! let count = signal(0);
//! let c = count.clone();
//! let label = Text::new()?;
//! label.set_text(vec![
//!     PropValue::from("Count: "),
//!     PropValue::getter(move || c.get().to_string()),
//! ])?;
//!
//! count.set(42); // label reads "Count: 42"
//! ```

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use crate::engine::{create_node, release_node, NodeId, NodeKind, Subscriptions};
use crate::error::Result;
use crate::properties::{build_merged, Conditionals, MergedProperties};
use crate::reactive::{effect, signal_with_equals, try_batch, Memo, Signal};
use crate::renderer::{Geometry, Material, Mesh, TextLayout};
use crate::state::context::Context;
use super::appearance::is_visible;
use super::component::Component;
use super::types::{event_handlers, ComponentInputs, ComponentKind, Internals, PropValue};

type Segments = Rc<Vec<PropValue<String>>>;

/// Interaction panel of the live generation.
type LivePanel = Rc<RefCell<Option<(NodeId, Mesh)>>>;

// =============================================================================
// Layout
// =============================================================================

/// Initializer writing the label and material of `mesh`.
fn layout_initializer(
    merged: Memo<Rc<MergedProperties>>,
    mesh: Mesh,
    segments: Signal<Segments>,
    context: Rc<Context>,
) -> impl FnOnce(&mut Subscriptions) -> Result<()> + 'static {
    move |subs| {
        let sync = effect(move || {
            let view = merged.get();
            let content: String = segments.get().iter().map(PropValue::get).collect();

            let config = context.config();
            let requested = view.read_text("fontFamily");
            let (font_family, font_url) = config.resolve_font(requested.as_deref());
            let font_size = view.read_number("fontSize", config.default_font_size);

            mesh.material.set_color(view.read("color", None));
            mesh.material.set_opacity(view.read_number("opacity", 1.0));
            mesh.material.set_visible(is_visible(&view));
            mesh.set_label(Some(TextLayout {
                content,
                font_family,
                font_url,
                font_size,
            }));
        });
        subs.register_effect(sync);
        Ok(())
    }
}

// =============================================================================
// Text Component
// =============================================================================

fn text_kind(segments: Signal<Segments>, live: LivePanel) -> ComponentKind {
    ComponentKind::new("text", move |args| {
        let merged = build_merged(Conditionals::new(), args.inputs());
        let handlers = event_handlers(&merged, Vec::new());

        let material = Material::new();
        let mesh = Mesh::new(Geometry::Panel, material.clone());
        let panel = create_node(NodeKind::Mesh(mesh.clone()));
        *live.borrow_mut() = Some((panel, mesh.clone()));

        let released = live.clone();
        Ok(Internals::new(merged.clone(), handlers)
            .with_resource(move || {
                material.dispose();
            })
            .with_resource(move || {
                released.borrow_mut().take();
                if let Err(error) = release_node(panel) {
                    tracing::warn!(node = %panel, %error, "releasing text panel failed");
                }
            })
            .with_node(panel)
            .with_initializer(layout_initializer(merged, mesh, segments.clone(), args.context.clone())))
    })
}

#[derive(Debug)]
pub struct Text {
    component: Component,
    segments: Signal<Segments>,
    live: LivePanel,
}

impl Text {
    pub fn new() -> Result<Self> {
        Self::with_content(Vec::<PropValue<String>>::new(), ComponentInputs::default())
    }

    /// Create a text with its content and inputs in place before the first
    /// generation is built.
    pub fn with_content<I, S>(segments: I, inputs: ComponentInputs) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<PropValue<String>>,
    {
        let segments: Segments = Rc::new(segments.into_iter().map(Into::into).collect());
        let segments = signal_with_equals(segments, |a: &Segments, b: &Segments| Rc::ptr_eq(a, b));
        let live: LivePanel = Rc::new(RefCell::new(None));
        let component = Component::with_inputs(text_kind(segments.clone(), live.clone()), inputs)?;
        Ok(Self {
            component,
            segments,
            live,
        })
    }

    /// Replace the content. Segments are concatenated in order.
    pub fn set_text<I, S>(&self, segments: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<PropValue<String>>,
    {
        let segments: Vec<PropValue<String>> = segments.into_iter().map(Into::into).collect();
        try_batch(|| {
            self.segments.set(Rc::new(segments));
        })
    }

    /// Interaction panel node of the live generation.
    pub fn panel(&self) -> Option<NodeId> {
        self.live.borrow().as_ref().map(|(node, _)| *node)
    }

    /// Current layout, `None` while unbound.
    pub fn layout(&self) -> Option<TextLayout> {
        self.live.borrow().as_ref().and_then(|(_, mesh)| mesh.label())
    }

    pub fn material(&self) -> Option<Material> {
        self.live.borrow().as_ref().map(|(_, mesh)| mesh.material.clone())
    }
}

impl Deref for Text {
    type Target = Component;

    fn deref(&self) -> &Component {
        &self.component
    }
}
